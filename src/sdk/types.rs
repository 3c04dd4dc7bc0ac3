//! SDK-specific types.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

use crate::error::Result;

/// URI scheme marking an argument as a blobstore object.
pub const BLOB_URL_SCHEME: &str = "blob";

/// Body of a downloaded object.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Metadata about an object in the blobstore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobFileStat {
    /// Directory portion of the object path, including the trailing slash
    pub path: String,
    /// Final path segment
    pub name: String,
    /// MIME type reported by the server
    pub mime_type: String,
    /// Size reported by the server
    pub size_bytes: u64,
    /// False when the server answered 404
    pub exists: bool,
}

impl BlobFileStat {
    /// Stat for an object path, with the path split at its final `/`.
    pub fn for_path(object_path: &str) -> Self {
        let (path, name) = match object_path.rfind('/') {
            Some(idx) => (&object_path[..=idx], &object_path[idx + 1..]),
            None => ("", object_path),
        };
        Self {
            path: path.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// A downloaded object: its metadata plus a stream over its contents.
pub struct BlobFile {
    pub stat: BlobFileStat,
    pub contents: ByteStream,
}

impl BlobFile {
    /// Read the whole body into memory.
    ///
    /// The buffer grows with the bytes actually received; the reported size
    /// comes from the server and is not trusted for allocation.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.contents.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl fmt::Debug for BlobFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobFile")
            .field("stat", &self.stat)
            .finish_non_exhaustive()
    }
}

/// A command-line argument naming either a blobstore object or a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobRef {
    /// Object path relative to the blobstore base URL
    Remote(String),
    /// Path on the local filesystem
    Local(PathBuf),
}

impl BlobRef {
    /// Classify an argument by its URI scheme.
    ///
    /// `blob:/a/b` and `blob:a/b` both name the remote object `a/b`. Anything
    /// that is not an absolute URI with the `blob` scheme is a local path.
    pub fn parse(arg: &str) -> Self {
        match Url::parse(arg) {
            Ok(url) if url.scheme() == BLOB_URL_SCHEME => {
                let mut path = String::new();
                if let Some(host) = url.host_str() {
                    path.push_str(host);
                }
                path.push_str(&percent_decode_str(url.path()).decode_utf8_lossy());
                Self::Remote(path.trim_start_matches('/').to_string())
            }
            _ => Self::Local(PathBuf::from(arg)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(path) => write!(f, "{}:/{}", BLOB_URL_SCHEME, path),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Which way a copy moved data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyDirection {
    Upload,
    Download,
}
