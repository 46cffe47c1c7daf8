//! Query configuration.

use crate::error::Error;
use crate::operators::ComparisonOp;
use serde::{Deserialize, Serialize};

/// Default child property delimiter.
pub const DEFAULT_CHILD_DELIMITER: &str = ".";

/// Default maximum nesting depth of a condition tree.
pub const DEFAULT_MAX_CONDITION_DEPTH: usize = 64;

/// Process-wide settings applied to every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Reject CONTAINS on every field.
    pub disable_contains: bool,
    /// Reject STARTSWITH on every field.
    pub disable_starts_with: bool,
    /// Reject ENDSWITH on every field.
    pub disable_ends_with: bool,
    /// Separator between a property and its child properties.
    pub child_delimiter: String,
    /// Deepest allowed condition nesting, or `None` for no limit.
    pub max_condition_depth: Option<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            disable_contains: false,
            disable_starts_with: false,
            disable_ends_with: false,
            child_delimiter: DEFAULT_CHILD_DELIMITER.to_string(),
            max_condition_depth: Some(DEFAULT_MAX_CONDITION_DEPTH),
        }
    }
}

impl QueryConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set whether CONTAINS is disabled globally.
    pub fn with_contains_disabled(mut self, disabled: bool) -> Self {
        self.disable_contains = disabled;
        self
    }

    /// Set whether STARTSWITH is disabled globally.
    pub fn with_starts_with_disabled(mut self, disabled: bool) -> Self {
        self.disable_starts_with = disabled;
        self
    }

    /// Set whether ENDSWITH is disabled globally.
    pub fn with_ends_with_disabled(mut self, disabled: bool) -> Self {
        self.disable_ends_with = disabled;
        self
    }

    /// Set the child property delimiter.
    pub fn with_child_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.child_delimiter = delimiter.into();
        self
    }

    /// Set the maximum condition depth.
    pub fn with_max_condition_depth(mut self, depth: Option<usize>) -> Self {
        self.max_condition_depth = depth;
        self
    }

    /// Check if `op` is disabled for every field.
    pub fn is_globally_disabled(&self, op: ComparisonOp) -> bool {
        match op {
            ComparisonOp::Contains => self.disable_contains,
            ComparisonOp::StartsWith => self.disable_starts_with,
            ComparisonOp::EndsWith => self.disable_ends_with,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.child_delimiter, ".");
        assert_eq!(config.max_condition_depth, Some(64));
        for op in ComparisonOp::ALL {
            assert!(!config.is_globally_disabled(op));
        }
    }

    #[test]
    fn test_global_flags() {
        let config = QueryConfig::new()
            .with_contains_disabled(true)
            .with_ends_with_disabled(true);

        assert!(config.is_globally_disabled(ComparisonOp::Contains));
        assert!(!config.is_globally_disabled(ComparisonOp::StartsWith));
        assert!(config.is_globally_disabled(ComparisonOp::EndsWith));
        assert!(!config.is_globally_disabled(ComparisonOp::Eq));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            QueryConfig::from_json(r#"{"disable_starts_with": true, "child_delimiter": "__"}"#)
                .unwrap();
        assert!(config.disable_starts_with);
        assert_eq!(config.child_delimiter, "__");
        assert_eq!(config.max_condition_depth, Some(64));

        let unlimited = QueryConfig::from_json(r#"{"max_condition_depth": null}"#).unwrap();
        assert_eq!(unlimited.max_condition_depth, None);
    }
}
