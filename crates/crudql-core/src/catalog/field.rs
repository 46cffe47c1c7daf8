//! Field definitions for entities.

use super::policy::FieldPolicy;
use super::types::FieldType;
use crate::operators::ComparisonOp;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A field definition within an entity.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct FieldDef {
    /// Declared field name.
    pub name: String,
    /// External (public) name accepted in requests in addition to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Field data type.
    pub field_type: FieldType,
    /// Whether the field is required (non-nullable at the application level).
    #[serde(default = "default_required")]
    pub required: bool,
    /// Disallowed comparison operators, if the field carries a policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<FieldPolicy>,
}

fn default_required() -> bool {
    true
}

impl FieldDef {
    /// Create a new required field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            field_type,
            required: true,
            policy: None,
        }
    }

    /// Create an optional field (required = false).
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::new(name, field_type)
        }
    }

    /// Set the external alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attach a query policy.
    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Disallow specific comparison operators on this field.
    pub fn deny_operators(self, ops: impl IntoIterator<Item = ComparisonOp>) -> Self {
        self.with_policy(FieldPolicy::deny(ops))
    }

    /// Check if a request name refers to this field.
    ///
    /// Matches the declared name or the alias, ignoring case.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
    }

    /// Check if `op` is disallowed by this field's policy.
    pub fn disallows(&self, op: ComparisonOp) -> bool {
        self.policy.as_ref().is_some_and(|p| p.disallows(op))
    }
}
