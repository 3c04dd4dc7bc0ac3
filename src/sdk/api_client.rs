//! HTTP client for the blobstore API.
//!
//! Maps object operations onto HTTP verbs against paths resolved from a
//! single base URL. Every request passes through a credential provider
//! before it is sent.

use futures::TryStreamExt;
use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method, Request, Response, StatusCode};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::sdk::credentials::CredentialProvider;
use crate::sdk::sniff::{detect_content_type, SNIFF_LEN};
use crate::sdk::types::{BlobFile, BlobFileStat};
use crate::VERSION;

/// Per-request timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sub-path under the base URL serving directory listings.
pub const LIST_DIR_PATH: &str = "_dir/";

/// User agent string for API requests.
fn user_agent() -> String {
    format!("blobstore-cli/{} (rust)", VERSION)
}

/// Ensure the base URL ends in `/` so that relative resolution keeps its
/// full path as a prefix.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    if base_url.ends_with('/') {
        Ok(Url::parse(base_url)?)
    } else {
        Ok(Url::parse(&format!("{}/", base_url))?)
    }
}

fn stat_from_response(path: &str, response: &Response) -> BlobFileStat {
    let headers = response.headers();
    let mut stat = BlobFileStat::for_path(path.trim_start_matches('/'));
    stat.exists = true;
    stat.mime_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    stat.size_bytes = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    stat
}

/// Turn a non-200 response into an error carrying its body text.
async fn api_error(operation: &'static str, response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::api(operation, status, body)
}

/// API client for the blobstore.
#[derive(Debug, Clone)]
pub struct BlobStoreApiClient {
    client: Client,
    base_url: Url,
    credential_provider: Arc<dyn CredentialProvider>,
    timeout: Duration,
}

impl BlobStoreApiClient {
    /// Create a new API client with the default 30 second timeout.
    pub fn new(base_url: &str, credential_provider: Arc<dyn CredentialProvider>) -> Result<Self> {
        Self::with_timeout(
            base_url,
            credential_provider,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a new API client with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        credential_provider: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            credential_provider,
            timeout,
        })
    }

    /// Get the base URL. Always ends in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve an object path against the base URL.
    ///
    /// Leading slashes are stripped first; otherwise the path would resolve
    /// against the host root and drop the base URL's own path.
    pub fn route(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Build a request tagged with a request id and authorized by the
    /// credential provider.
    fn authorized_request(&self, method: Method, url: Url) -> Result<Request> {
        let mut request = self
            .client
            .request(method, url)
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .build()?;
        self.credential_provider.authorize(&mut request)?;
        Ok(request)
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!("{} {}", method, url);

        let response = self.client.execute(request).await?;
        debug!("{} {} -> {}", method, url, response.status());
        Ok(response)
    }

    /// Upload a stream to `path`.
    ///
    /// An empty `content_type` is replaced by one sniffed from the first
    /// 512 bytes of the stream.
    pub async fn upload_stream<R>(&self, path: &str, mut stream: R, content_type: &str) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let url = self.route(path)?;

        let mut head = Vec::new();
        let content_type = if content_type.is_empty() {
            (&mut stream)
                .take(SNIFF_LEN as u64)
                .read_to_end(&mut head)
                .await?;
            detect_content_type(&head).to_string()
        } else {
            content_type.to_string()
        };

        let mut request = self.authorized_request(Method::POST, url)?;
        let content_type = HeaderValue::from_str(&content_type).map_err(|_| {
            Error::InvalidHeader {
                header: "Content-Type",
            }
        })?;
        request.headers_mut().insert(CONTENT_TYPE, content_type);

        let body = Cursor::new(head).chain(stream);
        *request.body_mut() = Some(Body::wrap_stream(ReaderStream::new(body)));

        let response = self.execute(request).await?;
        if response.status() != StatusCode::OK {
            return Err(api_error("Upload", response).await);
        }
        Ok(())
    }

    /// Fetch metadata for `path` without transferring its body.
    ///
    /// A 404 is reported as `exists: false`, not as an error.
    pub async fn get_stat(&self, path: &str) -> Result<BlobFileStat> {
        let url = self.route(path)?;
        let request = self.authorized_request(Method::HEAD, url)?;
        let response = self.execute(request).await?;

        match response.status() {
            StatusCode::OK => Ok(stat_from_response(path, &response)),
            StatusCode::NOT_FOUND => Ok(BlobFileStat::for_path(path.trim_start_matches('/'))),
            _ => Err(api_error("Stat", response).await),
        }
    }

    /// Fetch `path` and return its metadata with a stream over its body.
    pub async fn get_file(&self, path: &str) -> Result<BlobFile> {
        let url = self.route(path)?;
        let request = self.authorized_request(Method::GET, url)?;
        let response = self.execute(request).await?;

        if response.status() != StatusCode::OK {
            return Err(api_error("Download", response).await);
        }

        let stat = stat_from_response(path, &response);
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(BlobFile {
            stat,
            contents: Box::pin(StreamReader::new(stream)),
        })
    }

    /// List object paths under `prefix`.
    pub async fn list_prefix(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let prefix = prefix.trim_start_matches('/');
        let mut url = self.route(&format!("{}{}", LIST_DIR_PATH, prefix))?;
        if recursive {
            url.set_query(Some("recursive=true"));
        }

        let request = self.authorized_request(Method::GET, url)?;
        let response = self.execute(request).await?;

        if response.status() != StatusCode::OK {
            return Err(api_error("List", response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Delete `path`.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let url = self.route(path)?;
        let request = self.authorized_request(Method::DELETE, url)?;
        let response = self.execute(request).await?;

        if response.status() != StatusCode::OK {
            return Err(api_error("Delete", response).await);
        }
        Ok(())
    }
}
