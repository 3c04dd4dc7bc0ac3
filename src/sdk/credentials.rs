//! Request authorization for the blobstore API.
//!
//! The blobstore authorizes requests through two headers, one carrying the
//! read ACL token and one carrying the write ACL token. Providers fill in
//! whichever of the two is still missing from a request:
//! 1. Environment variables (BLOBSTORE_READ_ACL, BLOBSTORE_WRITE_ACL)
//! 2. Explicit tokens (empty by default)
//!
//! A header that is already present is never overwritten, so the first
//! provider to supply a header wins.

use once_cell::sync::Lazy;
use reqwest::header::HeaderValue;
use reqwest::Request;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Header carrying the read ACL token.
pub const READ_ACL_HEADER: &str = "X-BlobStore-Read-Acl";

/// Header carrying the write ACL token.
pub const WRITE_ACL_HEADER: &str = "X-BlobStore-Write-Acl";

/// Environment variable consulted for the read ACL token.
pub const READ_ACL_ENV: &str = "BLOBSTORE_READ_ACL";

/// Environment variable consulted for the write ACL token.
pub const WRITE_ACL_ENV: &str = "BLOBSTORE_WRITE_ACL";

static DEFAULT_CHAIN: Lazy<Arc<CredentialProviderChain>> =
    Lazy::new(|| Arc::new(CredentialProviderChain::default()));

/// Something that can attach ACL headers to an outgoing request.
pub trait CredentialProvider: Send + Sync + Debug {
    /// Add any missing ACL headers to the request.
    fn authorize(&self, request: &mut Request) -> Result<()>;
}

/// Whether the request already carries a read ACL header.
pub fn has_read_acl(request: &Request) -> bool {
    request.headers().contains_key(READ_ACL_HEADER)
}

/// Whether the request already carries a write ACL header.
pub fn has_write_acl(request: &Request) -> bool {
    request.headers().contains_key(WRITE_ACL_HEADER)
}

fn insert_header(request: &mut Request, header: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader { header })?;
    request.headers_mut().insert(header, value);
    Ok(())
}

/// Provider holding a fixed pair of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectCredentialProvider {
    pub read_acl: String,
    pub write_acl: String,
}

impl DirectCredentialProvider {
    pub fn new(read_acl: impl Into<String>, write_acl: impl Into<String>) -> Self {
        Self {
            read_acl: read_acl.into(),
            write_acl: write_acl.into(),
        }
    }
}

impl CredentialProvider for DirectCredentialProvider {
    fn authorize(&self, request: &mut Request) -> Result<()> {
        if !has_read_acl(request) {
            insert_header(request, READ_ACL_HEADER, &self.read_acl)?;
        }
        if !has_write_acl(request) {
            insert_header(request, WRITE_ACL_HEADER, &self.write_acl)?;
        }
        Ok(())
    }
}

/// Provider reading tokens from environment variables at request time.
///
/// An unset variable leaves its header untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentCredentialProvider {
    pub read_acl_var: String,
    pub write_acl_var: String,
}

impl EnvironmentCredentialProvider {
    pub fn new(read_acl_var: impl Into<String>, write_acl_var: impl Into<String>) -> Self {
        Self {
            read_acl_var: read_acl_var.into(),
            write_acl_var: write_acl_var.into(),
        }
    }
}

impl Default for EnvironmentCredentialProvider {
    fn default() -> Self {
        Self::new(READ_ACL_ENV, WRITE_ACL_ENV)
    }
}

impl CredentialProvider for EnvironmentCredentialProvider {
    fn authorize(&self, request: &mut Request) -> Result<()> {
        if !has_read_acl(request) {
            if let Ok(acl) = std::env::var(&self.read_acl_var) {
                insert_header(request, READ_ACL_HEADER, &acl)?;
            }
        }
        if !has_write_acl(request) {
            if let Ok(acl) = std::env::var(&self.write_acl_var) {
                insert_header(request, WRITE_ACL_HEADER, &acl)?;
            }
        }
        Ok(())
    }
}

/// Ordered list of providers, consulted until both headers are present.
#[derive(Debug)]
pub struct CredentialProviderChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialProviderChain {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for CredentialProviderChain {
    /// Environment variables first, then empty direct tokens.
    fn default() -> Self {
        Self::new(vec![
            Box::new(EnvironmentCredentialProvider::default()),
            Box::new(DirectCredentialProvider::default()),
        ])
    }
}

impl CredentialProvider for CredentialProviderChain {
    fn authorize(&self, request: &mut Request) -> Result<()> {
        for provider in &self.providers {
            provider.authorize(request)?;
            if has_read_acl(request) && has_write_acl(request) {
                return Ok(());
            }
        }
        // Unauthenticated requests are left for the server to reject.
        Ok(())
    }
}

/// The shared default chain. Constructed on first use; every call returns
/// the same instance.
pub fn default_chain() -> Arc<CredentialProviderChain> {
    Arc::clone(&DEFAULT_CHAIN)
}
