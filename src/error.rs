//! Error types for the blobstore client.

use thiserror::Error;

/// Result type alias for blobstore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the blobstore client.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Protocol Errors =====
    #[error("Blobstore {operation} Failed ({status}){}", body_suffix(.body))]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid header value for {header}")]
    InvalidHeader { header: &'static str },

    // ===== Configuration Errors =====
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    // ===== Precondition Errors =====
    #[error("Nothing to append")]
    NothingToAppend,

    #[error("Cannot append to local file")]
    LocalAppend,

    #[error("{0}")]
    UnsupportedCopy(&'static str),

    #[error("Destination file already exists on {location}; use --force to overwrite")]
    DestinationExists { location: &'static str },

    #[error("{0}")]
    InvalidArgument(String),

    // ===== I/O Errors =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== HTTP Errors =====
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl Error {
    /// Create an API error from a failed response.
    pub fn api(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            operation,
            status,
            body: body.into(),
        }
    }

    /// HTTP status carried by a protocol error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error was raised before any request was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NothingToAppend
                | Self::LocalAppend
                | Self::UnsupportedCopy(_)
                | Self::DestinationExists { .. }
                | Self::InvalidArgument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_body() {
        let err = Error::api(
            "Upload",
            404,
            "{\"code\":\"NotFound\",\"message\":\"File not found\"}",
        );
        assert_eq!(
            err.to_string(),
            "Blobstore Upload Failed (404): {\"code\":\"NotFound\",\"message\":\"File not found\"}"
        );
    }

    #[test]
    fn test_api_error_display_without_body() {
        let err = Error::api("Stat", 403, "");
        assert_eq!(err.to_string(), "Blobstore Stat Failed (403)");
    }

    #[test]
    fn test_api_error_constructor() {
        let err = Error::api("List", 500, "boom");
        match err {
            Error::Api {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, "List");
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            _ => panic!("Expected Api error"),
        }
    }

    #[test]
    fn test_error_status() {
        assert_eq!(Error::api("Delete", 401, "").status(), Some(401));
        assert_eq!(Error::NothingToAppend.status(), None);
    }

    #[test]
    fn test_precondition_errors() {
        assert!(Error::NothingToAppend.is_precondition());
        assert!(Error::LocalAppend.is_precondition());
        assert!(Error::DestinationExists { location: "blobstore" }.is_precondition());
        assert!(!Error::api("Upload", 500, "").is_precondition());

        assert_eq!(Error::LocalAppend.to_string(), "Cannot append to local file");
        assert_eq!(
            Error::DestinationExists {
                location: "local machine"
            }
            .to_string(),
            "Destination file already exists on local machine; use --force to overwrite"
        );
    }

    #[test]
    fn test_invalid_url_error() {
        let err: Error = url::Url::parse(":broken/").unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid URL:"));
    }
}
