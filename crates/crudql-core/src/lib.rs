//! crudql core - schema catalog, query validation and backend compilation.
//!
//! This crate turns the backend-agnostic condition language of a generic
//! CRUD surface into native queries:
//!
//! - [`catalog`] - statically built schema descriptors and registration
//! - [`path`] - nested property path resolution
//! - [`operators`] - operator synonym tables
//! - [`coercion`] - literal to typed value conversion
//! - [`validate`] - request validation against schema, policy and config
//! - [`compile`] - recursive-descent compiler and its backends
//! - [`operation`] - CRUD operation policy

pub mod catalog;
pub mod coercion;
pub mod compile;
pub mod config;
pub mod error;
pub mod operation;
pub mod operators;
pub mod path;
pub mod validate;

pub use catalog::{
    EntityDef, FieldDef, FieldPolicy, FieldType, OperatorRule, Record, ScalarType, SchemaBundle,
};
pub use coercion::{coerce, CoercionError};
pub use compile::{
    CompileError, CompileResult, CompiledQuery, Dialect, DocumentBackend, QueryBackend,
    QueryCompiler, QueryError, RelationalBackend, SqlFragment, SqlPredicate,
};
pub use config::QueryConfig;
pub use error::Error;
pub use operation::{allows_operation, CrudOperation};
pub use operators::{ComparisonOp, LogicalOp};
pub use path::{PathError, PathResolver, PropertyPath};
pub use validate::{QueryValidator, ValidationError};

/// Re-export protocol types.
pub use crudql_proto as proto;
