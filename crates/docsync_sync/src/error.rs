//! Error types for the sync coordinator.

use crate::state::SyncState;
use docsync_core::CoreError;
use docsync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Backend error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid input to a pure operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The operation requires a completed hydration.
    #[error("coordinator is not ready (state: {state})")]
    NotReady {
        /// Current state.
        state: SyncState,
    },

    /// Invalid state transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: SyncState,
        /// Attempted target state.
        to: SyncState,
    },
}

impl SyncError {
    /// Returns true if the backend rejected the session's authorization.
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Storage(e) if e.is_auth())
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Storage(e) if e.is_retryable())
    }
}
