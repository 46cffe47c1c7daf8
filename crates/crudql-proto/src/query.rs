//! Query input model.
//!
//! These types mirror the JSON request shape accepted by the CRUD surface.
//! Field names are matched case-insensitively on input (see [`Query::from_json`])
//! and emitted in camelCase on output.
//!
//! Note: The condition tree is recursive, so these types use serde rather
//! than rkyv.

use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// An untyped literal as it arrives in a request body.
///
/// Literals carry no knowledge of the field they are compared against; the
/// core crate coerces them into a typed [`crate::Value`] once the target
/// field has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// JSON boolean.
    Bool(bool),
    /// JSON integer.
    Integer(i64),
    /// JSON floating point number.
    Float(f64),
    /// JSON string.
    Text(String),
}

impl Literal {
    /// Canonical textual form fed to coercion.
    pub fn as_text(&self) -> String {
        match self {
            Literal::Bool(b) => b.to_string(),
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Integer(v as i64)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

/// Field-to-value equality filter used by the `ByFilter` operations.
///
/// A `null` value matches records where the field is null.
pub type FilterMap = BTreeMap<String, Option<Literal>>;

/// Parse a filter map from a JSON object.
pub fn parse_filter(json: &str) -> Result<FilterMap, Error> {
    Ok(serde_json::from_str(json)?)
}

/// A full read query against one record type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Fields to return (allowlist projection).
    #[serde(deserialize_with = "null_as_default")]
    pub includes: Vec<String>,
    /// Fields to omit (denylist projection).
    #[serde(deserialize_with = "null_as_default")]
    pub excludes: Vec<String>,
    /// Root of the condition tree.
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Sort keys, in precedence order.
    #[serde(
        rename(serialize = "orderBy", deserialize = "orderby"),
        deserialize_with = "null_as_default"
    )]
    pub order_by: Vec<Sort>,
    /// Maximum number of records to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Number of records to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
}

impl Query {
    /// Create an empty query (everything, unsorted, unpaginated).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query from JSON, matching field names case-insensitively.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a query from an already-parsed JSON document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        Ok(serde_json::from_value(lowercase_keys(value)?)?)
    }

    /// Set the included fields.
    pub fn with_includes(mut self, fields: Vec<String>) -> Self {
        self.includes = fields;
        self
    }

    /// Set the excluded fields.
    pub fn with_excludes(mut self, fields: Vec<String>) -> Self {
        self.excludes = fields;
        self
    }

    /// Set the condition tree.
    pub fn with_where(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Add a sort key.
    pub fn with_order(mut self, sort: Sort) -> Self {
        self.order_by.push(sort);
        self
    }

    /// Set the limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the skip count.
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// A node of the condition tree.
///
/// A well-formed condition is either a leaf (`field` + `comparison_operator`
/// with `value` or `values`) or a composite (`grouped_conditions`), never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    /// Field name, possibly a nested path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Comparison operator or one of its synonyms.
    #[serde(
        rename(serialize = "comparisonOperator", deserialize = "comparisonoperator"),
        skip_serializing_if = "Option::is_none"
    )]
    pub comparison_operator: Option<String>,
    /// Single comparison value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
    /// Values for set-membership operators.
    #[serde(
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub values: Vec<Literal>,
    /// Nested groups; `None` when the key is absent.
    #[serde(
        rename(serialize = "groupedConditions", deserialize = "groupedconditions"),
        skip_serializing_if = "Option::is_none"
    )]
    pub grouped_conditions: Option<Vec<Option<GroupedCondition>>>,
}

impl Condition {
    /// Create a single-value leaf condition.
    pub fn leaf(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Literal>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            comparison_operator: Some(operator.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Create a multi-value leaf condition (IN / NIN).
    pub fn multi(
        field: impl Into<String>,
        operator: impl Into<String>,
        values: Vec<Literal>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            comparison_operator: Some(operator.into()),
            values,
            ..Self::default()
        }
    }

    /// Create a leaf condition without a value (null comparison).
    pub fn null(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            comparison_operator: Some(operator.into()),
            ..Self::default()
        }
    }

    /// Create a composite condition from groups.
    pub fn grouped(groups: Vec<GroupedCondition>) -> Self {
        Self {
            grouped_conditions: Some(groups.into_iter().map(Some).collect()),
            ..Self::default()
        }
    }

    /// Parse a condition from JSON, matching field names case-insensitively.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(serde_json::from_value(lowercase_keys(value)?)?)
    }
}

/// A boolean group of conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupedCondition {
    /// Logical operator or one of its synonyms; AND when absent.
    #[serde(
        rename(serialize = "logicalOperator", deserialize = "logicaloperator"),
        skip_serializing_if = "Option::is_none"
    )]
    pub logical_operator: Option<String>,
    /// Child conditions, in order.
    #[serde(deserialize_with = "null_as_default")]
    pub conditions: Vec<Option<Condition>>,
}

impl GroupedCondition {
    /// Create a group with an explicit logical operator.
    pub fn new(operator: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            logical_operator: Some(operator.into()),
            conditions: conditions.into_iter().map(Some).collect(),
        }
    }

    /// Create a group with no logical operator.
    pub fn implicit(conditions: Vec<Condition>) -> Self {
        Self {
            logical_operator: None,
            conditions: conditions.into_iter().map(Some).collect(),
        }
    }

    /// Create an AND group.
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::new("AND", conditions)
    }

    /// Create an OR group.
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::new("OR", conditions)
    }
}

/// A sort key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sort {
    /// Field to sort by.
    pub field: Option<String>,
    /// Descending when true; ascending when false or absent.
    #[serde(
        rename(serialize = "isDescending", deserialize = "isdescending"),
        skip_serializing_if = "Option::is_none"
    )]
    pub is_descending: Option<bool>,
}

impl Sort {
    /// Create an ascending sort key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            is_descending: None,
        }
    }

    /// Create a descending sort key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            is_descending: Some(true),
        }
    }

    /// Check if this key sorts descending.
    pub fn descending(&self) -> bool {
        self.is_descending.unwrap_or(false)
    }
}

/// Lowercase every object key, recursively.
///
/// The request schema only nests objects under structural keys, so literal
/// values are never affected. Two keys of one object that differ only in
/// case are rejected.
pub fn lowercase_keys(value: serde_json::Value) -> Result<serde_json::Value, Error> {
    match value {
        serde_json::Value::Object(map) => {
            let mut lowered = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                let folded = key.to_lowercase();
                if lowered.contains_key(&folded) {
                    return Err(Error::DuplicateKey(key));
                }
                lowered.insert(folded, lowercase_keys(value)?);
            }
            Ok(serde_json::Value::Object(lowered))
        }
        serde_json::Value::Array(items) => Ok(serde_json::Value::Array(
            items
                .into_iter()
                .map(lowercase_keys)
                .collect::<Result<_, _>>()?,
        )),
        other => Ok(other),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_is_case_insensitive() {
        let query = Query::from_json(
            r#"{
                "Includes": ["Name"],
                "WHERE": {
                    "groupedConditions": [{
                        "LogicalOperator": "or",
                        "Conditions": [
                            {"Field": "Id", "comparisonoperator": "EQ", "Value": "1"},
                            {"field": "Id", "ComparisonOperator": "EQ", "value": 2}
                        ]
                    }]
                },
                "OrderBy": [{"Field": "Name", "IsDescending": true}],
                "Limit": 10,
                "SKIP": 5
            }"#,
        )
        .unwrap();

        assert_eq!(query.includes, vec!["Name".to_string()]);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.skip, Some(5));
        assert!(query.order_by[0].descending());

        let groups = query.condition.unwrap().grouped_conditions.unwrap();
        let group = groups[0].as_ref().unwrap();
        assert_eq!(group.logical_operator.as_deref(), Some("or"));
        assert_eq!(
            group.conditions[1].as_ref().unwrap().value,
            Some(Literal::Integer(2))
        );
    }

    #[test]
    fn test_literal_values_keep_their_case() {
        let condition =
            Condition::from_json(r#"{"field": "Name", "comparisonOperator": "EQ", "value": "MiXeD"}"#)
                .unwrap();
        assert_eq!(condition.value, Some(Literal::Text("MiXeD".into())));
    }

    #[test]
    fn test_keys_differing_only_in_case_are_rejected() {
        let err = Condition::from_json(r#"{"Field": "Age", "field": "Name"}"#).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        let err = Query::from_json(r#"{"where": {"groupedConditions": [{"conditions": [
                {"field": "Age", "Value": "1", "VALUE": "2", "comparisonOperator": "EQ"}
            ]}]}}"#)
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        assert!(Query::from_json(r#"{"Limit": 1, "where": {"field": "limit"}}"#).is_ok());
    }

    #[test]
    fn test_nulls_become_defaults() {
        let query =
            Query::from_json(r#"{"includes": null, "orderBy": null, "where": null}"#).unwrap();
        assert!(query.includes.is_empty());
        assert!(query.order_by.is_empty());
        assert!(query.condition.is_none());
    }

    #[test]
    fn test_null_group_entries_are_preserved() {
        let condition = Condition::from_json(r#"{"groupedConditions": [null]}"#).unwrap();
        assert_eq!(condition.grouped_conditions, Some(vec![None]));
    }

    #[test]
    fn test_serializes_camel_case() {
        let query = Query::new()
            .with_where(Condition::leaf("Age", "GT", "18"))
            .with_order(Sort::desc("Age"));
        let json = serde_json::to_value(&query).unwrap();

        assert_eq!(json["where"]["comparisonOperator"], "GT");
        assert_eq!(json["orderBy"][0]["isDescending"], true);
    }

    #[test]
    fn test_literal_text_forms() {
        assert_eq!(Literal::Bool(true).as_text(), "true");
        assert_eq!(Literal::Integer(-3).as_text(), "-3");
        assert_eq!(Literal::Float(2.5).as_text(), "2.5");
        assert_eq!(Literal::from("abc").as_text(), "abc");
    }

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter(r#"{"Name": "Ada", "Age": 36, "Email": null}"#).unwrap();
        assert_eq!(filter.len(), 3);
        assert_eq!(filter["Name"], Some(Literal::Text("Ada".into())));
        assert_eq!(filter["Age"], Some(Literal::Integer(36)));
        assert_eq!(filter["Email"], None);
    }

    #[test]
    fn test_sort_defaults_to_ascending() {
        assert!(!Sort::asc("Name").descending());
        let sort = Sort {
            field: Some("Name".into()),
            is_descending: Some(false),
        };
        assert!(!sort.descending());
    }
}
