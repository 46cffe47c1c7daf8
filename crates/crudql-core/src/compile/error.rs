//! Compile error types.

use crate::coercion::CoercionError;
use crate::operators::ComparisonOp;
use crate::path::PathError;
use crate::validate::ValidationError;
use thiserror::Error;

/// Errors raised while compiling a query for a backend.
///
/// Everything except [`CompileError::Unsupported`] is caused by the request.
/// `Unsupported` means the validator accepted an operator the backend cannot
/// express, which is a defect rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A literal could not be converted to the field's type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// A field reference is structurally broken.
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    /// The entity is not registered.
    #[error("Unknown entity '{0}'.")]
    UnknownEntity(String),

    /// A field reference does not resolve.
    #[error("Field '{0}' does not exist.")]
    UnknownField(String),

    /// An operator is not in the alias tables.
    #[error("Unknown operator '{0}'.")]
    UnknownOperator(String),

    /// The backend stores the field outside the record's own columns.
    #[error("Field '{field}' is a collection and cannot be queried on the {backend} backend.")]
    CollectionPath {
        /// Backend name.
        backend: &'static str,
        /// Display name of the resolved path.
        field: String,
    },

    /// The condition tree is not well formed.
    #[error("{0}")]
    Malformed(String),

    /// The backend does not implement an operator.
    #[error("internal error: {backend} backend does not implement the {operator} operator")]
    Unsupported {
        /// Backend name.
        backend: &'static str,
        /// Canonical operator.
        operator: ComparisonOp,
    },
}

impl CompileError {
    /// Check if this error is a defect rather than a bad request.
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Unsupported { .. })
    }
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Failure of the combined validate-then-compile pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The request was rejected by validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The request passed validation but could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl QueryError {
    /// Check if this error is a defect rather than a bad request.
    pub fn is_internal(&self) -> bool {
        matches!(self, QueryError::Compile(e) if e.is_internal())
    }
}
