//! BlobStoreClient - high level client over the blobstore API.
//!
//! Adds local file I/O, append and copy on top of the primitive
//! operations of [`BlobStoreApiClient`].

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sdk::api_client::BlobStoreApiClient;
use crate::sdk::credentials::CredentialProvider;
use crate::sdk::types::{BlobFileStat, BlobRef, ByteStream, CopyDirection};

/// Client for uploading, downloading and appending to blobstore objects.
#[derive(Debug, Clone)]
pub struct BlobStoreClient {
    api_client: BlobStoreApiClient,
}

impl BlobStoreClient {
    /// Create a new client for the blobstore at `base_url`.
    pub fn new(base_url: &str, credential_provider: Arc<dyn CredentialProvider>) -> Result<Self> {
        Ok(Self::from_api_client(BlobStoreApiClient::new(
            base_url,
            credential_provider,
        )?))
    }

    /// Create a new client with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        credential_provider: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self::from_api_client(BlobStoreApiClient::with_timeout(
            base_url,
            credential_provider,
            timeout,
        )?))
    }

    pub fn from_api_client(api_client: BlobStoreApiClient) -> Self {
        Self { api_client }
    }

    /// Get the underlying API client.
    pub fn api_client(&self) -> &BlobStoreApiClient {
        &self.api_client
    }

    // ===== Upload =====

    /// Upload a stream to `path`. See [`BlobStoreApiClient::upload_stream`].
    pub async fn upload_stream<R>(&self, path: &str, stream: R, content_type: &str) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        self.api_client.upload_stream(path, stream, content_type).await
    }

    /// Upload the local file `source` to `path`.
    pub async fn upload_file(
        &self,
        path: &str,
        source: impl AsRef<Path>,
        content_type: &str,
    ) -> Result<()> {
        let source = source.as_ref();
        let file = fs::File::open(source).await?;
        self.api_client.upload_stream(path, file, content_type).await?;
        info!("Uploaded {:?} to {}", source, path);
        Ok(())
    }

    // ===== Download =====

    /// Open a stream over the contents of `path`.
    pub async fn get_file_read_stream(&self, path: &str) -> Result<ByteStream> {
        Ok(self.api_client.get_file(path).await?.contents)
    }

    /// Read the full contents of `path` into memory.
    pub async fn get_file_contents(&self, path: &str) -> Result<Vec<u8>> {
        self.api_client.get_file(path).await?.into_bytes().await
    }

    /// Download `path` to the local file `dest`, creating parent directories
    /// as needed. An existing file at `dest` is overwritten.
    pub async fn download_file(&self, path: &str, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        let contents = self.get_file_contents(path).await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(dest, &contents).await?;
        info!("Downloaded {} to {:?} ({} bytes)", path, dest, contents.len());
        Ok(())
    }

    /// Write the contents of `path` to `out`. Returns the number of bytes
    /// written.
    pub async fn cat_file<W>(&self, path: &str, out: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut file = self.api_client.get_file(path).await?;
        let written = tokio::io::copy(&mut file.contents, out).await?;
        out.flush().await?;
        Ok(written)
    }

    // ===== Metadata =====

    pub async fn stat_file(&self, path: &str) -> Result<BlobFileStat> {
        self.api_client.get_stat(path).await
    }

    /// Whether `target` exists, remotely or on the local filesystem.
    pub async fn exists(&self, target: &BlobRef) -> Result<bool> {
        match target {
            BlobRef::Remote(path) => Ok(self.stat_file(path).await?.exists),
            BlobRef::Local(path) => match fs::metadata(path).await {
                Ok(_) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            },
        }
    }

    // ===== Append =====

    /// Append `stream` to the existing object at `path`.
    ///
    /// The object is downloaded, concatenated with `stream` in memory and
    /// uploaded again with its original content type. Nothing guards the
    /// object between the read and the write, so a concurrent writer's
    /// changes can be lost. Appending to a missing object fails.
    pub async fn append_stream<R>(&self, path: &str, stream: R) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let existing = self.api_client.get_file(path).await?;
        let content_type = existing.stat.mime_type.clone();
        let contents = existing.into_bytes().await?;
        debug!(
            "Appending to {} ({} existing bytes, {})",
            path,
            contents.len(),
            content_type
        );

        let combined = Cursor::new(contents).chain(stream);
        self.api_client
            .upload_stream(path, combined, &content_type)
            .await
    }

    /// Append a string to the object at `path`.
    pub async fn append_string(&self, path: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::NothingToAppend);
        }
        self.append_stream(path, Cursor::new(value.as_bytes().to_vec()))
            .await
    }

    /// Append the contents of the local file `source` to the object at `path`.
    pub async fn append_file(&self, path: &str, source: impl AsRef<Path>) -> Result<()> {
        let file = fs::File::open(source.as_ref()).await?;
        self.append_stream(path, file).await
    }

    /// Append a string to `target`, which must name a remote object.
    pub async fn append(&self, target: &BlobRef, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::NothingToAppend);
        }
        match target {
            BlobRef::Remote(path) => self.append_string(path, value).await,
            BlobRef::Local(_) => Err(Error::LocalAppend),
        }
    }

    // ===== Copy =====

    /// Copy between a local path and a remote object, in either direction.
    ///
    /// Unless `force` is set, an existing destination is an error and
    /// nothing is transferred. `content_type` applies to uploads only.
    pub async fn copy(
        &self,
        src: &BlobRef,
        dst: &BlobRef,
        force: bool,
        content_type: &str,
    ) -> Result<CopyDirection> {
        match (src, dst) {
            (BlobRef::Remote(_), BlobRef::Remote(_)) => Err(Error::UnsupportedCopy(
                "No support for copying files in the blobstore directly",
            )),
            (BlobRef::Local(_), BlobRef::Local(_)) => Err(Error::UnsupportedCopy(
                "Must provide at least one blob:/ path to upload to or download from",
            )),
            (BlobRef::Remote(path), BlobRef::Local(dest)) => {
                if !force && self.exists(dst).await? {
                    return Err(Error::DestinationExists {
                        location: "local machine",
                    });
                }
                self.download_file(path, dest).await?;
                Ok(CopyDirection::Download)
            }
            (BlobRef::Local(source), BlobRef::Remote(path)) => {
                if !force && self.exists(dst).await? {
                    return Err(Error::DestinationExists {
                        location: "blobstore",
                    });
                }
                self.upload_file(path, source, content_type).await?;
                Ok(CopyDirection::Upload)
            }
        }
    }

    // ===== Listing and deletion =====

    pub async fn list_prefix(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        self.api_client.list_prefix(prefix, recursive).await
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.api_client.delete_file(path).await?;
        info!("Deleted {}", path);
        Ok(())
    }
}
