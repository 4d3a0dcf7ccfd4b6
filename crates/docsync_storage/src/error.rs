//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// A zero-replica read is not an error: backends return the caller's
/// fallback instead.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Token acquisition failed or the remote store rejected the token.
    ///
    /// Fatal to the remote session. The caller may fall back to the
    /// local backend.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// A request to the remote store failed.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// HTTP status, if a response was received.
        status: Option<u16>,
    },

    /// The remote store answered with an unexpected payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A replica's content is not valid JSON or not the expected shape.
    ///
    /// Contained at the replica level: logged, then treated as empty.
    #[error("malformed replica {replica}: {reason}")]
    Parse {
        /// Handle of the offending replica.
        replica: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A remote operation was attempted before `connect()`.
    #[error("not connected to remote store")]
    NotConnected,

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Creates a network error without an HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a network error for an HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Returns true if the session cannot continue without re-authorizing.
    pub fn is_auth(&self) -> bool {
        matches!(self, StorageError::Auth(_))
    }

    /// Returns true if the same call may succeed when issued again.
    ///
    /// Nothing in this crate retries automatically; this only informs the
    /// caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Network { status: None, .. } => true,
            StorageError::Network {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
