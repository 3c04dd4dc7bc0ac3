//! Blobstore SDK.
//!
//! # Architecture
//!
//! - `api_client` - HTTP client for the blobstore API
//! - `client` - Local file I/O, append and copy on top of the API client
//! - `credentials` - Read/write ACL header providers
//! - `sniff` - Content-type detection for uploads
//! - `types` - SDK-specific types

pub mod api_client;
pub mod client;
pub mod credentials;
pub mod sniff;
pub mod types;

pub use api_client::BlobStoreApiClient;
pub use client::BlobStoreClient;
pub use credentials::{
    default_chain, CredentialProvider, CredentialProviderChain, DirectCredentialProvider,
    EnvironmentCredentialProvider,
};
pub use types::*;
