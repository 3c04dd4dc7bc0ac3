//! Blobstore client library and CLI.
//!
//! A thin client for a remote blob storage HTTP service. Objects are named
//! by paths resolved against a single base URL and can be uploaded,
//! downloaded, appended to, listed and deleted.
//!
//! # Architecture
//!
//! 1. **Credentials** (`sdk::credentials`) - Read/write ACL headers from a provider chain
//! 2. **API Client** (`sdk::api_client`) - One HTTP request per primitive operation
//! 3. **Client** (`sdk::client`) - Local file I/O, append and copy
//! 4. **CLI** (`cli`, `config`) - Subcommand parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use blobstore::sdk::{default_chain, BlobStoreClient};
//!
//! # async fn example() -> blobstore::Result<()> {
//! let client = BlobStoreClient::new("https://blob.example.org", default_chain())?;
//! client.append_string("logs/today.txt", "another line\n").await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod sdk;

pub use error::{Error, Result};

/// Crate version, reported in the user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
