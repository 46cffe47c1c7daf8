//! Per-field query policy.

use crate::operators::ComparisonOp;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One entry of a field's disallowed-operator list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum OperatorRule {
    /// Every comparison operator.
    All,
    /// A single canonical operator.
    Only(ComparisonOp),
}

impl TryFrom<String> for OperatorRule {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("all") || value == "*" {
            return Ok(OperatorRule::All);
        }
        ComparisonOp::parse(&value)
            .map(OperatorRule::Only)
            .ok_or_else(|| format!("unknown comparison operator '{}'", value))
    }
}

impl From<OperatorRule> for String {
    fn from(rule: OperatorRule) -> Self {
        match rule {
            OperatorRule::All => "ALL".to_string(),
            OperatorRule::Only(op) => op.as_str().to_string(),
        }
    }
}

impl From<ComparisonOp> for OperatorRule {
    fn from(op: ComparisonOp) -> Self {
        OperatorRule::Only(op)
    }
}

/// Comparison operators a field refuses to be queried with.
///
/// A policy with no rules disallows every operator.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct FieldPolicy {
    /// Disallowed operators.
    #[serde(default)]
    pub disallowed: Vec<OperatorRule>,
}

impl FieldPolicy {
    /// A policy that disallows the given operators.
    pub fn deny(ops: impl IntoIterator<Item = ComparisonOp>) -> Self {
        Self {
            disallowed: ops.into_iter().map(OperatorRule::Only).collect(),
        }
    }

    /// A policy that disallows every operator.
    pub fn deny_all() -> Self {
        Self {
            disallowed: vec![OperatorRule::All],
        }
    }

    /// Check if `op` is disallowed by this policy.
    pub fn disallows(&self, op: ComparisonOp) -> bool {
        if self.disallowed.is_empty() {
            return true;
        }

        if self.disallowed.contains(&OperatorRule::Only(op)) {
            return true;
        }

        self.disallowed.contains(&OperatorRule::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_policy_disallows_everything() {
        let policy = FieldPolicy::default();
        for op in ComparisonOp::ALL {
            assert!(policy.disallows(op));
        }
    }

    #[test]
    fn test_specific_operators() {
        let policy = FieldPolicy::deny([ComparisonOp::Contains, ComparisonOp::EndsWith]);
        assert!(policy.disallows(ComparisonOp::Contains));
        assert!(policy.disallows(ComparisonOp::EndsWith));
        assert!(!policy.disallows(ComparisonOp::Eq));
        assert!(!policy.disallows(ComparisonOp::StartsWith));
    }

    #[test]
    fn test_wildcard() {
        let policy = FieldPolicy::deny_all();
        for op in ComparisonOp::ALL {
            assert!(policy.disallows(op));
        }
    }

    #[test]
    fn test_rules_parse_synonyms() {
        let policy: FieldPolicy =
            serde_json::from_str(r#"{"disallowed": ["like", "ALL", ">="]}"#).unwrap();
        assert_eq!(
            policy.disallowed,
            vec![
                OperatorRule::Only(ComparisonOp::Contains),
                OperatorRule::All,
                OperatorRule::Only(ComparisonOp::Gte),
            ]
        );

        let err = serde_json::from_str::<FieldPolicy>(r#"{"disallowed": ["between"]}"#);
        assert!(err.is_err());
    }
}
