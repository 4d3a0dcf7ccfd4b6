//! Error types for DocSync core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in DocSync core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document date could not be parsed.
    #[error("invalid document date: {input}")]
    InvalidDate {
        /// The rejected input.
        input: String,
    },

    /// A sequence key or series code is malformed.
    #[error("invalid sequence key: {key}")]
    InvalidSequenceKey {
        /// The rejected key.
        key: String,
    },

    /// A sequence counter has no next number.
    #[error("sequence exhausted: {key}")]
    SequenceExhausted {
        /// The exhausted key.
        key: String,
    },

    /// A JSON object is not a valid record (missing or empty string `id`).
    #[error("record must have a non-empty string id")]
    InvalidRecord,

    /// A collection name is not one of the fixed logical names.
    #[error("unknown collection: {name}")]
    UnknownCollection {
        /// The rejected name.
        name: String,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
