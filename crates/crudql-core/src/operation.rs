//! CRUD operation kinds and the per-type operation denylist.
//!
//! Broad kinds (`Read`, `PartialUpdate`, `Delete`) encompass their specific
//! variants: denying `Read` on a type also denies `ReadById`, `ReadCount`
//! and so on.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of CRUD operation requested against a record type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
pub enum CrudOperation {
    /// Insert a record.
    Create,
    /// Any read.
    Read,
    /// Read one record by identifier.
    ReadById,
    /// Read records matching a field/value filter map.
    ReadByFilter,
    /// Read records matching a query.
    ReadByQuery,
    /// Count records.
    ReadCount,
    /// Replace a record.
    Update,
    /// Any partial update.
    PartialUpdate,
    /// Partially update one record by identifier.
    PartialUpdateById,
    /// Partially update records matching a filter map.
    PartialUpdateByFilter,
    /// Any delete.
    Delete,
    /// Delete one record by identifier.
    DeleteById,
    /// Delete records matching a filter map.
    DeleteByFilter,
    /// Delete records matching a query.
    DeleteByQuery,
}

impl CrudOperation {
    /// All operation kinds.
    pub const ALL: [CrudOperation; 14] = [
        CrudOperation::Create,
        CrudOperation::Read,
        CrudOperation::ReadById,
        CrudOperation::ReadByFilter,
        CrudOperation::ReadByQuery,
        CrudOperation::ReadCount,
        CrudOperation::Update,
        CrudOperation::PartialUpdate,
        CrudOperation::PartialUpdateById,
        CrudOperation::PartialUpdateByFilter,
        CrudOperation::Delete,
        CrudOperation::DeleteById,
        CrudOperation::DeleteByFilter,
        CrudOperation::DeleteByQuery,
    ];

    /// The broad kind that subsumes this one, if any.
    pub fn encompassing(&self) -> Option<CrudOperation> {
        match self {
            CrudOperation::ReadById
            | CrudOperation::ReadByFilter
            | CrudOperation::ReadByQuery
            | CrudOperation::ReadCount => Some(CrudOperation::Read),
            CrudOperation::PartialUpdateById | CrudOperation::PartialUpdateByFilter => {
                Some(CrudOperation::PartialUpdate)
            }
            CrudOperation::DeleteById
            | CrudOperation::DeleteByFilter
            | CrudOperation::DeleteByQuery => Some(CrudOperation::Delete),
            CrudOperation::Create
            | CrudOperation::Read
            | CrudOperation::Update
            | CrudOperation::PartialUpdate
            | CrudOperation::Delete => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudOperation::Create => "Create",
            CrudOperation::Read => "Read",
            CrudOperation::ReadById => "ReadById",
            CrudOperation::ReadByFilter => "ReadByFilter",
            CrudOperation::ReadByQuery => "ReadByQuery",
            CrudOperation::ReadCount => "ReadCount",
            CrudOperation::Update => "Update",
            CrudOperation::PartialUpdate => "PartialUpdate",
            CrudOperation::PartialUpdateById => "PartialUpdateById",
            CrudOperation::PartialUpdateByFilter => "PartialUpdateByFilter",
            CrudOperation::Delete => "Delete",
            CrudOperation::DeleteById => "DeleteById",
            CrudOperation::DeleteByFilter => "DeleteByFilter",
            CrudOperation::DeleteByQuery => "DeleteByQuery",
        }
    }
}

/// Decide whether `operation` is permitted under a type's denylist.
///
/// `None` means the type carries no denylist and everything is allowed. An
/// empty denylist blocks every operation.
pub fn allows_operation(denylist: Option<&[CrudOperation]>, operation: CrudOperation) -> bool {
    let Some(denied) = denylist else {
        return true;
    };

    if denied.is_empty() {
        return false;
    }

    if denied.contains(&operation) {
        return false;
    }

    match operation.encompassing() {
        Some(broad) => !denied.contains(&broad),
        None => true,
    }
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an operation name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown CRUD operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for CrudOperation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrudOperation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}
