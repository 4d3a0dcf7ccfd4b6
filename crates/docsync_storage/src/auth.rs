//! Access tokens and the delegated-authorization seam.
//!
//! How a token is obtained (browser consent flow, device code, service
//! account) is outside this crate. The remote backend only asks a
//! [`TokenProvider`] for a bearer token when it connects.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::fmt;

/// A bearer token for the remote object store.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for the `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Source of access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Acquires a token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Auth`] if no token can be obtained.
    async fn acquire(&self) -> StorageResult<AccessToken>;
}

/// A provider handing out a token obtained out of band.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: Option<AccessToken>,
}

impl StaticTokenProvider {
    /// Creates a provider for a known token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(AccessToken::new(token)),
        }
    }

    /// Creates a provider from an environment variable.
    ///
    /// A missing or empty variable makes every `acquire` fail with
    /// [`StorageError::Auth`].
    pub fn from_env(var: &str) -> Self {
        let token = std::env::var(var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(AccessToken::new);
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn acquire(&self) -> StorageResult<AccessToken> {
        self.token
            .clone()
            .ok_or_else(|| StorageError::Auth("no access token available".into()))
    }
}
