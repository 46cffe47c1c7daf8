//! Operator alias tables.
//!
//! Requests may spell operators in several ways (`GT`, `greaterThan`, `>`).
//! Two process-wide tables map every accepted synonym, case-insensitively,
//! to a single canonical operator. The tables are built on first use and
//! are read-only afterwards.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Canonical logical operator for combining conditions.
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
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    /// All conditions must hold.
    And,
    /// At least one condition must hold.
    Or,
}

/// Canonical comparison operator.
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
#[serde(rename_all = "UPPERCASE")]
pub enum ComparisonOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Member of a set.
    In,
    /// Not a member of a set.
    Nin,
    /// Text contains a substring.
    Contains,
    /// Text starts with a prefix.
    StartsWith,
    /// Text ends with a suffix.
    EndsWith,
}

const LOGICAL_SYNONYMS: &[(&str, LogicalOp)] = &[
    ("and", LogicalOp::And),
    ("&&", LogicalOp::And),
    ("&", LogicalOp::And),
    ("all", LogicalOp::And),
    ("andalso", LogicalOp::And),
    ("or", LogicalOp::Or),
    ("||", LogicalOp::Or),
    ("|", LogicalOp::Or),
    ("any", LogicalOp::Or),
    ("orelse", LogicalOp::Or),
];

const COMPARISON_SYNONYMS: &[(&str, ComparisonOp)] = &[
    ("eq", ComparisonOp::Eq),
    ("=", ComparisonOp::Eq),
    ("==", ComparisonOp::Eq),
    ("equal", ComparisonOp::Eq),
    ("equals", ComparisonOp::Eq),
    ("ne", ComparisonOp::Ne),
    ("neq", ComparisonOp::Ne),
    ("!=", ComparisonOp::Ne),
    ("<>", ComparisonOp::Ne),
    ("notequal", ComparisonOp::Ne),
    ("notequals", ComparisonOp::Ne),
    ("gt", ComparisonOp::Gt),
    (">", ComparisonOp::Gt),
    ("greaterthan", ComparisonOp::Gt),
    ("gte", ComparisonOp::Gte),
    ("ge", ComparisonOp::Gte),
    (">=", ComparisonOp::Gte),
    ("greaterthanorequal", ComparisonOp::Gte),
    ("greaterthanorequalto", ComparisonOp::Gte),
    ("lt", ComparisonOp::Lt),
    ("<", ComparisonOp::Lt),
    ("lessthan", ComparisonOp::Lt),
    ("lte", ComparisonOp::Lte),
    ("le", ComparisonOp::Lte),
    ("<=", ComparisonOp::Lte),
    ("lessthanorequal", ComparisonOp::Lte),
    ("lessthanorequalto", ComparisonOp::Lte),
    ("in", ComparisonOp::In),
    ("anyof", ComparisonOp::In),
    ("nin", ComparisonOp::Nin),
    ("notin", ComparisonOp::Nin),
    ("noneof", ComparisonOp::Nin),
    ("contains", ComparisonOp::Contains),
    ("like", ComparisonOp::Contains),
    ("startswith", ComparisonOp::StartsWith),
    ("beginswith", ComparisonOp::StartsWith),
    ("endswith", ComparisonOp::EndsWith),
];

static LOGICAL_ALIASES: LazyLock<HashMap<&'static str, LogicalOp>> =
    LazyLock::new(|| LOGICAL_SYNONYMS.iter().copied().collect());

static COMPARISON_ALIASES: LazyLock<HashMap<&'static str, ComparisonOp>> =
    LazyLock::new(|| COMPARISON_SYNONYMS.iter().copied().collect());

impl LogicalOp {
    /// Resolve a synonym to its canonical operator, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        LOGICAL_ALIASES.get(name.to_lowercase().as_str()).copied()
    }

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }

    /// Every synonym accepted for logical operators.
    pub fn synonyms() -> impl Iterator<Item = (&'static str, LogicalOp)> {
        LOGICAL_SYNONYMS.iter().copied()
    }
}

impl ComparisonOp {
    /// All canonical comparison operators.
    pub const ALL: [ComparisonOp; 11] = [
        ComparisonOp::Eq,
        ComparisonOp::Ne,
        ComparisonOp::Gt,
        ComparisonOp::Gte,
        ComparisonOp::Lt,
        ComparisonOp::Lte,
        ComparisonOp::In,
        ComparisonOp::Nin,
        ComparisonOp::Contains,
        ComparisonOp::StartsWith,
        ComparisonOp::EndsWith,
    ];

    /// Resolve a synonym to its canonical operator, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        COMPARISON_ALIASES.get(name.to_lowercase().as_str()).copied()
    }

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "EQ",
            ComparisonOp::Ne => "NE",
            ComparisonOp::Gt => "GT",
            ComparisonOp::Gte => "GTE",
            ComparisonOp::Lt => "LT",
            ComparisonOp::Lte => "LTE",
            ComparisonOp::In => "IN",
            ComparisonOp::Nin => "NIN",
            ComparisonOp::Contains => "CONTAINS",
            ComparisonOp::StartsWith => "STARTSWITH",
            ComparisonOp::EndsWith => "ENDSWITH",
        }
    }

    /// Check if this operator matches text patterns.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Contains | ComparisonOp::StartsWith | ComparisonOp::EndsWith
        )
    }

    /// Check if this operator takes a set of values.
    pub fn is_multi_value(&self) -> bool {
        matches!(self, ComparisonOp::In | ComparisonOp::Nin)
    }

    /// Every synonym accepted for comparison operators.
    pub fn synonyms() -> impl Iterator<Item = (&'static str, ComparisonOp)> {
        COMPARISON_SYNONYMS.iter().copied()
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
