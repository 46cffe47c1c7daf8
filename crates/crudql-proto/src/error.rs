//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The request body is not valid JSON or does not match the input model.
    #[error("invalid request body: {0}")]
    Json(#[from] serde_json::Error),

    /// An object repeats a key, ignoring case.
    #[error("invalid request body: key '{0}' is given more than once (keys are case-insensitive)")]
    DuplicateKey(String),

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}
