//! Core type definitions for the catalog.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;

/// Scalar data types a record field can hold.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
}

/// Field types - flat representation without recursion.
///
/// Nested objects are referenced by entity name and resolved through the
/// [`super::SchemaBundle`], so a schema can describe arbitrarily deep (even
/// self-referencing) records without recursive types.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
    /// An array of scalar values.
    ArrayScalar(ScalarType),
    /// An enumeration type.
    Enum {
        /// Name of the enum type.
        name: String,
        /// Allowed variant values.
        variants: Vec<String>,
    },
    /// An optional enumeration.
    OptionalEnum {
        /// Name of the enum type.
        name: String,
        /// Allowed variant values.
        variants: Vec<String>,
    },
    /// An embedded entity (nested object).
    Embedded {
        /// Name of the embedded entity type.
        entity: String,
    },
    /// An optional embedded entity.
    OptionalEmbedded {
        /// Name of the embedded entity type.
        entity: String,
    },
    /// An array of embedded entities.
    ArrayEmbedded {
        /// Name of the embedded entity type.
        entity: String,
    },
}

impl ScalarType {
    /// Type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "Bool",
            ScalarType::Int32 => "Int32",
            ScalarType::Int64 => "Int64",
            ScalarType::Float32 => "Float32",
            ScalarType::Float64 => "Float64",
            ScalarType::String => "String",
            ScalarType::Timestamp => "Timestamp",
            ScalarType::Uuid => "Uuid",
        }
    }
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create an optional scalar field type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        FieldType::OptionalScalar(scalar)
    }

    /// Create an array of scalars field type.
    pub fn array_scalar(scalar: ScalarType) -> Self {
        FieldType::ArrayScalar(scalar)
    }

    /// Create an enum field type.
    pub fn enum_type(name: impl Into<String>, variants: Vec<String>) -> Self {
        FieldType::Enum {
            name: name.into(),
            variants,
        }
    }

    /// Create an embedded entity field type.
    pub fn embedded(entity: impl Into<String>) -> Self {
        FieldType::Embedded {
            entity: entity.into(),
        }
    }

    /// Create an array of embedded entities field type.
    pub fn array_embedded(entity: impl Into<String>) -> Self {
        FieldType::ArrayEmbedded {
            entity: entity.into(),
        }
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            FieldType::OptionalScalar(_)
                | FieldType::OptionalEnum { .. }
                | FieldType::OptionalEmbedded { .. }
        )
    }

    /// Check if this type is an array.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FieldType::ArrayScalar(_) | FieldType::ArrayEmbedded { .. }
        )
    }

    /// Get the inner scalar type if this is a scalar-based type.
    pub fn scalar_type(&self) -> Option<&ScalarType> {
        match self {
            FieldType::Scalar(s) | FieldType::OptionalScalar(s) | FieldType::ArrayScalar(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Name of the nested entity for composite types.
    ///
    /// For arrays of embedded entities this is the element type, which is
    /// what child paths resolve against.
    pub fn embedded_entity(&self) -> Option<&str> {
        match self {
            FieldType::Embedded { entity }
            | FieldType::OptionalEmbedded { entity }
            | FieldType::ArrayEmbedded { entity } => Some(entity),
            _ => None,
        }
    }

    /// Check if child properties can be resolved through this type.
    pub fn is_composite(&self) -> bool {
        self.embedded_entity().is_some()
    }

    /// Check if values of this type can be matched as text.
    pub fn is_text_like(&self) -> bool {
        match self {
            FieldType::Enum { .. } | FieldType::OptionalEnum { .. } => true,
            other => other.scalar_type() == Some(&ScalarType::String),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(s) => write!(f, "{}", s.name()),
            FieldType::OptionalScalar(s) => write!(f, "Optional<{}>", s.name()),
            FieldType::ArrayScalar(s) => write!(f, "Array<{}>", s.name()),
            FieldType::Enum { name, .. } => write!(f, "{}", name),
            FieldType::OptionalEnum { name, .. } => write!(f, "Optional<{}>", name),
            FieldType::Embedded { entity } => write!(f, "{}", entity),
            FieldType::OptionalEmbedded { entity } => write!(f, "Optional<{}>", entity),
            FieldType::ArrayEmbedded { entity } => write!(f, "Array<{}>", entity),
        }
    }
}
