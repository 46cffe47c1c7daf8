//! Core error types.

use thiserror::Error;

/// Core errors raised outside validation and compilation.
#[derive(Debug, Error)]
pub enum Error {
    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] crudql_proto::Error),

    /// JSON document could not be read.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Entity is not registered in the schema.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
}
