//! crudql protocol types.
//!
//! This crate defines the request-side model of the generic CRUD query
//! surface and the typed runtime values that compiled queries carry.
//!
//! # Modules
//!
//! - [`value`] - Typed runtime values produced by coercion
//! - [`query`] - Query input model (conditions, groups, sort, pagination)
//! - [`result`] - Validation outcome returned to callers
//! - [`error`] - Protocol error types
//!
//! # Parsing
//!
//! ```
//! use crudql_proto::Query;
//!
//! let query = Query::from_json(r#"{"Where": {"Field": "Age", "ComparisonOperator": "GT", "Value": "18"}}"#)
//!     .unwrap();
//! assert!(query.condition.is_some());
//! ```

pub mod error;
pub mod query;
pub mod result;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use query::{parse_filter, Condition, FilterMap, GroupedCondition, Literal, Query, Sort};
pub use result::ValidationResult;
pub use value::Value;
