//! Configuration management for the blobstore CLI.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sdk::api_client::DEFAULT_TIMEOUT_SECS;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Command-line arguments for the blobstore CLI.
#[derive(Parser, Debug, Clone)]
#[command(name = "blob")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Blobstore CLI")]
#[command(long_about = "Download, upload or append data to the blobstore")]
pub struct Args {
    /// Blobstore base URL
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL, env = "BLOBSTORE_URL")]
    pub url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value = "30", env = "BLOBSTORE_TIMEOUT")]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true, env = "BLOBSTORE_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Blobstore subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Copy files to and from blobstore
    ///
    /// Upload files to or download files from the blobstore. With a single
    /// blob:/ argument, print the object to standard output.
    #[command(name = "cp")]
    Cp {
        /// <LocalPath> or <BlobPath>
        src: String,

        /// <BlobPath> or <LocalPath>
        dst: Option<String>,

        /// Content type of uploaded file
        #[arg(short = 't', long = "type", default_value = "")]
        content_type: String,

        /// Force the copy if the destination already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Append to an existing file in the blobstore
    Append {
        /// <BlobPath>
        path: String,

        /// String to append
        #[arg(short, long, conflicts_with = "file")]
        string: Option<String>,

        /// Local file whose contents to append
        #[arg(short = 'F', long)]
        file: Option<PathBuf>,
    },

    /// List existing files in the blobstore
    Ls {
        /// [BlobPath]
        path: Option<String>,

        /// List all files and folders recursively
        #[arg(short, long)]
        recursive: bool,
    },

    /// Delete a file from the blobstore
    Rm {
        /// <BlobPath>
        path: String,
    },
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Blobstore base URL
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Debug mode
    pub debug: bool,
}

impl Config {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base URL must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            base_url: args.url.clone(),
            timeout_secs: args.timeout,
            debug: args.debug,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
        }
    }
}
