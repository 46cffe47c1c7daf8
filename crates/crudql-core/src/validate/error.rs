//! Validation error types.

use crate::operators::ComparisonOp;
use crate::path::PathError;
use std::fmt;
use thiserror::Error;

/// Where in a request a field reference appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation {
    /// `includes` projection.
    Includes,
    /// `excludes` projection.
    Excludes,
    /// A `where` condition.
    Condition,
    /// An `orderBy` entry.
    OrderBy,
    /// A filter map key.
    Filter,
    /// A property of a partial update.
    Update,
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldLocation::Includes => "Includes",
            FieldLocation::Excludes => "Excludes",
            FieldLocation::Condition => "Condition",
            FieldLocation::OrderBy => "OrderBy",
            FieldLocation::Filter => "Filter",
            FieldLocation::Update => "Update",
        })
    }
}

/// Which kind of operator failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// `comparisonOperator`.
    Comparison,
    /// `logicalOperator`.
    Logical,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatorKind::Comparison => "comparison",
            OperatorKind::Logical => "logical",
        })
    }
}

/// What refused an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOrigin {
    /// One of the global configuration flags.
    Configuration,
    /// The field's own policy.
    Field,
}

impl fmt::Display for PolicyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyOrigin::Configuration => "is disabled",
            PolicyOrigin::Field => "is not allowed on this field",
        })
    }
}

/// A rejected query, filter or update.
///
/// The display form is the message handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The entity is not registered.
    #[error("Unknown entity '{0}'.")]
    UnknownEntity(String),

    /// Malformed request shape.
    #[error("{0}")]
    Structural(String),

    /// A field reference does not resolve.
    #[error("{location} field '{field}' does not exist.")]
    UnknownField {
        /// Where the reference appeared.
        location: FieldLocation,
        /// The reference as requested.
        field: String,
    },

    /// An operator is not in the alias tables.
    #[error("Unknown {kind} operator '{operator}'.")]
    UnknownOperator {
        /// Comparison or logical.
        kind: OperatorKind,
        /// The operator as requested.
        operator: String,
    },

    /// An operator is refused by configuration or field policy.
    #[error("The {operator} operator {origin} (field '{field}').")]
    PolicyViolation {
        /// Field being compared.
        field: String,
        /// Canonical operator.
        operator: ComparisonOp,
        /// What refused it.
        origin: PolicyOrigin,
    },

    /// A pattern value contains characters other than letters and digits.
    #[error("The {operator} value for field '{field}' can only contain letters and numbers.")]
    PatternValue {
        /// Field being compared.
        field: String,
        /// Canonical operator.
        operator: ComparisonOp,
    },

    /// A pagination value is out of range.
    #[error("{0}")]
    Range(String),

    /// A field reference is structurally broken.
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    /// A filter map has no entries.
    #[error("Filter cannot be empty.")]
    EmptyFilter,

    /// A partial update names no properties.
    #[error("Properties to update cannot be empty.")]
    EmptyUpdate,
}

impl ValidationError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        ValidationError::Structural(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ValidationError::UnknownField {
            location: FieldLocation::OrderBy,
            field: "Nope".into(),
        };
        assert_eq!(err.to_string(), "OrderBy field 'Nope' does not exist.");

        let err = ValidationError::PolicyViolation {
            field: "Name".into(),
            operator: ComparisonOp::Contains,
            origin: PolicyOrigin::Field,
        };
        assert_eq!(
            err.to_string(),
            "The CONTAINS operator is not allowed on this field (field 'Name')."
        );

        let err = ValidationError::UnknownOperator {
            kind: OperatorKind::Logical,
            operator: "xor".into(),
        };
        assert_eq!(err.to_string(), "Unknown logical operator 'xor'.");
        assert_eq!(ValidationError::EmptyFilter.to_string(), "Filter cannot be empty.");
    }
}
