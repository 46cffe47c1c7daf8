//! Document-store backend.
//!
//! Emits filters in the operator-document dialect common to document
//! databases: `{"Address.City": {"$eq": "Berlin"}}`, combined with `$and` /
//! `$or`. Nested fields are addressed with dotted paths of declared names.

use super::{CompileError, CompileResult, Operand, Projection, QueryBackend, SortKey};
use crate::coercion::{timestamp_text, uuid_text};
use crate::operators::{ComparisonOp, LogicalOp};
use crate::path::PropertyPath;
use crudql_proto::Value;
use serde_json::{json, Map, Value as Json};

/// Compiles to JSON filter documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBackend;

impl DocumentBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }

    /// Encode a typed value as extended JSON.
    ///
    /// Identifiers and timestamps are wrapped (`$uuid`, `$date`) so they
    /// survive the trip through a JSON driver with their type intact.
    pub fn encode_value(value: &Value) -> Json {
        match value {
            Value::Null => Json::Null,
            Value::Bool(b) => json!(b),
            Value::Int32(i) => json!(i),
            Value::Int64(i) => json!(i),
            Value::Float32(f) => json!(f),
            Value::Float64(f) => json!(f),
            Value::String(s) => json!(s),
            Value::Timestamp(micros) => match timestamp_text(*micros) {
                Some(text) => json!({ "$date": text }),
                None => json!({ "$date": { "$numberLong": micros.to_string() } }),
            },
            Value::Uuid(bytes) => json!({ "$uuid": uuid_text(bytes) }),
        }
    }

    fn key(path: &PropertyPath) -> String {
        path.join(".")
    }

    fn regex(op: ComparisonOp, text: &str) -> Option<String> {
        let escaped = regex::escape(text);
        match op {
            ComparisonOp::Contains => Some(escaped),
            ComparisonOp::StartsWith => Some(format!("^{}", escaped)),
            ComparisonOp::EndsWith => Some(format!("{}$", escaped)),
            _ => None,
        }
    }
}

impl QueryBackend for DocumentBackend {
    type Predicate = Json;
    type Sort = Vec<(String, i32)>;
    type Projection = Json;

    const NAME: &'static str = "document";

    fn compile_leaf(
        &self,
        path: &PropertyPath,
        op: ComparisonOp,
        operand: Operand,
    ) -> CompileResult<Json> {
        let condition = match (op, operand) {
            (ComparisonOp::Eq, Operand::Null) => json!({ "$eq": null }),
            (ComparisonOp::Ne, Operand::Null) => json!({ "$ne": null }),
            (ComparisonOp::Eq, Operand::Single(v)) => json!({ "$eq": Self::encode_value(&v) }),
            (ComparisonOp::Ne, Operand::Single(v)) => json!({ "$ne": Self::encode_value(&v) }),
            (ComparisonOp::Gt, Operand::Single(v)) => json!({ "$gt": Self::encode_value(&v) }),
            (ComparisonOp::Gte, Operand::Single(v)) => json!({ "$gte": Self::encode_value(&v) }),
            (ComparisonOp::Lt, Operand::Single(v)) => json!({ "$lt": Self::encode_value(&v) }),
            (ComparisonOp::Lte, Operand::Single(v)) => json!({ "$lte": Self::encode_value(&v) }),
            (ComparisonOp::In, Operand::Many(vs)) => {
                json!({ "$in": vs.iter().map(Self::encode_value).collect::<Vec<_>>() })
            }
            (ComparisonOp::Nin, Operand::Many(vs)) => {
                json!({ "$nin": vs.iter().map(Self::encode_value).collect::<Vec<_>>() })
            }
            (op, Operand::Pattern(text)) if op.is_pattern() => {
                let pattern = Self::regex(op, &text).ok_or(CompileError::Unsupported {
                    backend: Self::NAME,
                    operator: op,
                })?;
                json!({ "$regex": pattern })
            }
            (op, _) => {
                return Err(CompileError::Unsupported {
                    backend: Self::NAME,
                    operator: op,
                })
            }
        };

        let mut filter = Map::new();
        filter.insert(Self::key(path), condition);
        Ok(Json::Object(filter))
    }

    fn compile_group(&self, op: LogicalOp, children: Vec<Json>) -> Json {
        let key = match op {
            LogicalOp::And => "$and",
            LogicalOp::Or => "$or",
        };
        let mut group = Map::new();
        group.insert(key.to_string(), Json::Array(children));
        Json::Object(group)
    }

    fn compile_sort(&self, keys: &[SortKey]) -> Vec<(String, i32)> {
        keys.iter()
            .map(|k| (Self::key(&k.path), if k.descending { -1 } else { 1 }))
            .collect()
    }

    fn compile_projection(&self, projection: &Projection) -> Json {
        let flag = match projection {
            Projection::Include { .. } => 1,
            Projection::Exclude { .. } => 0,
        };
        Json::Object(
            projection
                .fields()
                .iter()
                .map(|p| (Self::key(p), json!(flag)))
                .collect(),
        )
    }
}
