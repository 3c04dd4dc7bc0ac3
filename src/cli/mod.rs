//! Execution of parsed subcommands against a [`BlobStoreClient`].
//!
//! Output that the user asked for (listings, `cp` to stdout) goes to the
//! supplied writer; everything else is logged.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::config::Command;
use crate::error::{Error, Result};
use crate::sdk::client::BlobStoreClient;
use crate::sdk::types::BlobRef;

/// Parse an argument that must name a remote object.
fn remote_path(arg: &str, message: &str) -> Result<String> {
    match BlobRef::parse(arg) {
        BlobRef::Remote(path) => Ok(path),
        BlobRef::Local(_) => Err(Error::InvalidArgument(message.to_string())),
    }
}

/// Run a single subcommand.
pub async fn run<W>(command: &Command, client: &BlobStoreClient, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Cp {
            src,
            dst: None,
            ..
        } => {
            let path = remote_path(src, "Must download files from blob:/")?;
            client.cat_file(&path, out).await?;
            Ok(())
        }
        Command::Cp {
            src,
            dst: Some(dst),
            content_type,
            force,
        } => {
            let src = BlobRef::parse(src);
            let dst = BlobRef::parse(dst);
            let direction = client.copy(&src, &dst, *force, content_type).await?;
            info!("Copied {} to {} ({:?})", src, dst, direction);
            Ok(())
        }
        Command::Append { path, string, file } => {
            let target = BlobRef::parse(path);
            match (string, file) {
                (Some(value), _) => client.append(&target, value).await,
                (None, Some(source)) => match target {
                    BlobRef::Remote(path) => client.append_file(&path, source).await,
                    BlobRef::Local(_) => Err(Error::LocalAppend),
                },
                (None, None) => Err(Error::NothingToAppend),
            }
        }
        Command::Ls { path, recursive } => {
            let prefix = match path {
                Some(arg) => remote_path(arg, "Must start remote ls path with blob:/")?,
                None => String::new(),
            };

            let files = client.list_prefix(&prefix, *recursive).await?;
            for file in files {
                out.write_all(file.as_bytes()).await?;
                out.write_all(b"\n").await?;
            }
            out.flush().await?;
            Ok(())
        }
        Command::Rm { path } => {
            let path = remote_path(path, "Cannot delete a local file")?;
            client.delete_file(&path).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::credentials::DirectCredentialProvider;
    use std::sync::Arc;
    use std::time::Duration;

    fn offline_client() -> BlobStoreClient {
        BlobStoreClient::with_timeout(
            "http://127.0.0.1:9/",
            Arc::new(DirectCredentialProvider::default()),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    async fn run_offline(command: Command) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        run(&command, &offline_client(), &mut out).await?;
        Ok(out)
    }

    #[test]
    fn test_remote_path() {
        assert_eq!(remote_path("blob:/a/b", "msg").unwrap(), "a/b");
        let err = remote_path("a/b", "msg").unwrap_err();
        assert_eq!(err.to_string(), "msg");
    }

    #[tokio::test]
    async fn test_cat_requires_remote() {
        let result = run_offline(Command::Cp {
            src: "local.txt".to_string(),
            dst: None,
            content_type: String::new(),
            force: false,
        })
        .await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_append_nothing() {
        let result = run_offline(Command::Append {
            path: "blob:/log".to_string(),
            string: None,
            file: None,
        })
        .await;
        assert!(matches!(result, Err(Error::NothingToAppend)));

        let result = run_offline(Command::Append {
            path: "blob:/log".to_string(),
            string: Some(String::new()),
            file: None,
        })
        .await;
        assert!(matches!(result, Err(Error::NothingToAppend)));
    }

    #[tokio::test]
    async fn test_append_local_file_target() {
        let result = run_offline(Command::Append {
            path: "local.log".to_string(),
            string: None,
            file: Some("source.txt".into()),
        })
        .await;
        assert!(matches!(result, Err(Error::LocalAppend)));
    }

    #[tokio::test]
    async fn test_ls_requires_remote() {
        let result = run_offline(Command::Ls {
            path: Some("dir/".to_string()),
            recursive: false,
        })
        .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Must start remote ls path with blob:/"
        );
    }

    #[tokio::test]
    async fn test_rm_requires_remote() {
        let result = run_offline(Command::Rm {
            path: "local.txt".to_string(),
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "Cannot delete a local file");
    }
}
