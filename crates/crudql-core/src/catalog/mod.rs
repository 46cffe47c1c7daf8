//! Schema catalog for crudql.
//!
//! The catalog holds explicit, statically built descriptors for every record
//! type the CRUD surface exposes: fields, aliases, static types, nested
//! schema references, per-field operator policy and per-type operation
//! denylists.

mod entity;
mod field;
mod policy;
mod schema;
mod types;

pub use entity::EntityDef;
pub use field::FieldDef;
pub use policy::{FieldPolicy, OperatorRule};
pub use schema::{Record, SchemaBundle};
pub use types::{FieldType, ScalarType};
