//! Value coercion.
//!
//! Request literals arrive untyped. Once the target field has been resolved,
//! its static type decides how the literal's text is parsed into a typed
//! [`Value`]. Conversion never falls back to a default: a literal that does
//! not parse is reported with the field, the value and the target type.

use crate::catalog::{FieldType, ScalarType};
use crate::operators::ComparisonOp;
use chrono::DateTime;
use crudql_proto::{Literal, Value};
use thiserror::Error;

/// Errors converting a literal to a field's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The literal does not parse as the target type.
    #[error("Value '{value}' for field '{field}' cannot be converted to {target}.")]
    Invalid {
        /// Field being compared.
        field: String,
        /// The literal as text.
        value: String,
        /// Target type name.
        target: String,
    },

    /// The operator needs a value but none was supplied.
    #[error("Field '{field}' requires a value for the {operator} operator.")]
    MissingValue {
        /// Field being compared.
        field: String,
        /// Canonical operator.
        operator: ComparisonOp,
    },

    /// A pattern operator was used on a field that is not text.
    #[error("Field '{field}' of type {field_type} cannot be matched with {operator}.")]
    NonTextPattern {
        /// Field being compared.
        field: String,
        /// Canonical operator.
        operator: ComparisonOp,
        /// Static type of the field.
        field_type: String,
    },

    /// The field is a nested object and has no comparable value.
    #[error("Field '{field}' of type {field_type} cannot be compared to a value.")]
    NonComparable {
        /// Field being compared.
        field: String,
        /// Static type of the field.
        field_type: String,
    },
}

/// Convert `literal` to the type of `field`.
pub fn coerce(field: &str, field_type: &FieldType, literal: &Literal) -> Result<Value, CoercionError> {
    let text = literal.as_text();
    match field_type {
        FieldType::Scalar(scalar)
        | FieldType::OptionalScalar(scalar)
        | FieldType::ArrayScalar(scalar) => coerce_scalar(field, *scalar, &text),
        FieldType::Enum { name, variants } | FieldType::OptionalEnum { name, variants } => variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(&text))
            .map(|v| Value::String(v.clone()))
            .ok_or_else(|| invalid(field, &text, name)),
        FieldType::Embedded { .. }
        | FieldType::OptionalEmbedded { .. }
        | FieldType::ArrayEmbedded { .. } => Err(CoercionError::NonComparable {
            field: field.to_string(),
            field_type: field_type.to_string(),
        }),
    }
}

/// Convert every literal in `literals` to the type of `field`.
pub fn coerce_all(
    field: &str,
    field_type: &FieldType,
    literals: &[Literal],
) -> Result<Vec<Value>, CoercionError> {
    literals
        .iter()
        .map(|literal| coerce(field, field_type, literal))
        .collect()
}

/// Text of a pattern operand.
///
/// Pattern operators compare text directly, so the field must be text-like
/// and the literal is used as written.
pub fn pattern_text(
    field: &str,
    field_type: &FieldType,
    operator: ComparisonOp,
    literal: &Literal,
) -> Result<String, CoercionError> {
    if !field_type.is_text_like() {
        return Err(CoercionError::NonTextPattern {
            field: field.to_string(),
            operator,
            field_type: field_type.to_string(),
        });
    }
    Ok(literal.as_text())
}

/// Canonical text of a stored identifier.
pub fn uuid_text(bytes: &[u8; 16]) -> String {
    uuid::Uuid::from_bytes(*bytes).hyphenated().to_string()
}

/// RFC 3339 text of a microsecond timestamp, if it is in range.
pub fn timestamp_text(micros: i64) -> Option<String> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.to_rfc3339())
}

fn coerce_scalar(field: &str, scalar: ScalarType, text: &str) -> Result<Value, CoercionError> {
    let fail = || invalid(field, text, scalar.name());
    let value = match scalar {
        ScalarType::String => Value::String(text.to_string()),
        ScalarType::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if text.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                return Err(fail());
            }
        }
        ScalarType::Int32 => Value::Int32(text.trim().parse().map_err(|_| fail())?),
        ScalarType::Int64 => Value::Int64(text.trim().parse().map_err(|_| fail())?),
        ScalarType::Float32 => {
            let v: f32 = text.trim().parse().map_err(|_| fail())?;
            if !v.is_finite() {
                return Err(fail());
            }
            Value::Float32(v)
        }
        ScalarType::Float64 => {
            let v: f64 = text.trim().parse().map_err(|_| fail())?;
            if !v.is_finite() {
                return Err(fail());
            }
            Value::Float64(v)
        }
        ScalarType::Timestamp => {
            let text = text.trim();
            match DateTime::parse_from_rfc3339(text) {
                Ok(dt) => Value::Timestamp(dt.timestamp_micros()),
                Err(_) => Value::Timestamp(text.parse().map_err(|_| fail())?),
            }
        }
        ScalarType::Uuid => {
            let id = uuid::Uuid::parse_str(text.trim()).map_err(|_| fail())?;
            Value::Uuid(id.into_bytes())
        }
    };
    Ok(value)
}

fn invalid(field: &str, value: &str, target: &str) -> CoercionError {
    CoercionError::Invalid {
        field: field.to_string(),
        value: value.to_string(),
        target: target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: ScalarType) -> FieldType {
        FieldType::scalar(s)
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(
            coerce("Age", &scalar(ScalarType::Int32), &"18".into()).unwrap(),
            Value::Int32(18)
        );
        assert_eq!(
            coerce("Age", &scalar(ScalarType::Int64), &Literal::Integer(7)).unwrap(),
            Value::Int64(7)
        );
        assert_eq!(
            coerce("Score", &scalar(ScalarType::Float64), &"2.5".into()).unwrap(),
            Value::Float64(2.5)
        );
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = coerce("Age", &scalar(ScalarType::Int32), &"eighteen".into()).unwrap_err();
        assert_eq!(
            err,
            CoercionError::Invalid {
                field: "Age".into(),
                value: "eighteen".into(),
                target: "Int32".into(),
            }
        );
        assert!(coerce("Age", &scalar(ScalarType::Int32), &"3000000000".into()).is_err());
        assert!(coerce("Score", &scalar(ScalarType::Float64), &"NaN".into()).is_err());
        assert!(coerce("Score", &scalar(ScalarType::Float32), &"inf".into()).is_err());
    }

    #[test]
    fn test_optional_unwraps() {
        let ty = FieldType::optional_scalar(ScalarType::Int32);
        assert_eq!(coerce("Age", &ty, &"5".into()).unwrap(), Value::Int32(5));
    }

    #[test]
    fn test_bool_ignores_case() {
        let ty = scalar(ScalarType::Bool);
        assert_eq!(coerce("Active", &ty, &"TRUE".into()).unwrap(), Value::Bool(true));
        assert_eq!(coerce("Active", &ty, &Literal::Bool(false)).unwrap(), Value::Bool(false));
        assert!(coerce("Active", &ty, &"yes".into()).is_err());
    }

    #[test]
    fn test_uuid_round_trip() {
        let ty = scalar(ScalarType::Uuid);
        let text = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let value = coerce("Id", &ty, &text.into()).unwrap();

        let Value::Uuid(bytes) = value else {
            panic!("expected uuid, got {value:?}");
        };
        assert_eq!(uuid_text(&bytes), text);
        assert_eq!(Value::Uuid(bytes).to_string(), text);

        let simple = coerce("Id", &ty, &"67E5504410B1426F9247BB680E5FE0C8".into()).unwrap();
        assert_eq!(simple, Value::Uuid(bytes));
        assert!(coerce("Id", &ty, &"not-a-uuid".into()).is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        let ty = scalar(ScalarType::Timestamp);
        let from_text = coerce("Created", &ty, &"1970-01-01T00:00:01Z".into()).unwrap();
        assert_eq!(from_text, Value::Timestamp(1_000_000));

        let from_micros = coerce("Created", &ty, &Literal::Integer(42)).unwrap();
        assert_eq!(from_micros, Value::Timestamp(42));

        assert!(coerce("Created", &ty, &"yesterday".into()).is_err());
        assert_eq!(
            timestamp_text(1_000_000).as_deref(),
            Some("1970-01-01T00:00:01+00:00")
        );
    }

    #[test]
    fn test_enum_canonical_spelling() {
        let ty = FieldType::enum_type("Status", vec!["Active".into(), "Suspended".into()]);
        assert_eq!(
            coerce("Status", &ty, &"active".into()).unwrap(),
            Value::String("Active".into())
        );
        assert!(matches!(
            coerce("Status", &ty, &"deleted".into()),
            Err(CoercionError::Invalid { target, .. }) if target == "Status"
        ));
    }

    #[test]
    fn test_array_element_type() {
        let ty = FieldType::array_scalar(ScalarType::Int32);
        let values = coerce_all("Tags", &ty, &["1".into(), Literal::Integer(2)]).unwrap();
        assert_eq!(values, vec![Value::Int32(1), Value::Int32(2)]);
    }

    #[test]
    fn test_embedded_not_comparable() {
        let err = coerce("Address", &FieldType::embedded("Address"), &"x".into()).unwrap_err();
        assert!(matches!(err, CoercionError::NonComparable { .. }));
    }

    #[test]
    fn test_pattern_text_requires_text_field() {
        let text = pattern_text(
            "Name",
            &scalar(ScalarType::String),
            ComparisonOp::Contains,
            &"abc".into(),
        )
        .unwrap();
        assert_eq!(text, "abc");

        let err = pattern_text(
            "Age",
            &scalar(ScalarType::Int32),
            ComparisonOp::StartsWith,
            &"1".into(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("STARTSWITH"));
    }
}
