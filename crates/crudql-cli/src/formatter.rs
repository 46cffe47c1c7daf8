//! Output formatters for command results.

use clap::ValueEnum;
use crudql_core::coercion::{timestamp_text, uuid_text};
use crudql_core::compile::SqlFragment;
use crudql_core::CrudOperation;
use crudql_proto::ValidationResult;
use serde_json::{json, Value as Json};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Plain text
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format a validation outcome.
    fn format_validation(&self, result: &ValidationResult) -> String;

    /// Format a compiled document query.
    fn format_document(&self, compiled: &Json) -> String;

    /// Format rendered SQL.
    fn format_sql(&self, fragment: &SqlFragment) -> String;

    /// Format an operation policy check.
    fn format_policy(&self, entity: &str, operation: CrudOperation, allowed: bool) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Text => Box::new(TextFormatter),
    }
}

fn pretty(value: &Json) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_validation(&self, result: &ValidationResult) -> String {
        serde_json::to_value(result)
            .map(|v| pretty(&v))
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_document(&self, compiled: &Json) -> String {
        pretty(compiled)
    }

    fn format_sql(&self, fragment: &SqlFragment) -> String {
        let params: Vec<Json> = fragment.params.iter().map(param_json).collect();
        pretty(&json!({
            "sql": fragment.sql,
            "params": params,
        }))
    }

    fn format_policy(&self, entity: &str, operation: CrudOperation, allowed: bool) -> String {
        pretty(&json!({
            "entity": entity,
            "operation": operation.as_str(),
            "allowed": allowed,
        }))
    }
}

/// Plain text formatter.
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_validation(&self, result: &ValidationResult) -> String {
        match &result.message {
            Some(message) if !result.is_valid => format!("invalid: {}", message),
            _ => "valid".to_string(),
        }
    }

    fn format_document(&self, compiled: &Json) -> String {
        let Some(fields) = compiled.as_object() else {
            return compiled.to_string();
        };
        fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_sql(&self, fragment: &SqlFragment) -> String {
        let mut output = fragment.sql.clone();
        for (i, param) in fragment.params.iter().enumerate() {
            output.push_str(&format!("\n  {} = {} ({})", i + 1, param, param.type_name()));
        }
        output
    }

    fn format_policy(&self, entity: &str, operation: CrudOperation, allowed: bool) -> String {
        let verdict = if allowed { "allows" } else { "denies" };
        format!("{} {} {}", entity, verdict, operation)
    }
}

/// Bind parameters as plain JSON scalars.
fn param_json(value: &crudql_proto::Value) -> Json {
    use crudql_proto::Value;
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => json!(b),
        Value::Int32(i) => json!(i),
        Value::Int64(i) => json!(i),
        Value::Float32(f) => json!(f),
        Value::Float64(f) => json!(f),
        Value::String(s) => json!(s),
        Value::Timestamp(micros) => timestamp_text(*micros).map_or_else(|| json!(micros), Json::from),
        Value::Uuid(bytes) => json!(uuid_text(bytes)),
    }
}
