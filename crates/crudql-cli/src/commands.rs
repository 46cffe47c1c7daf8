//! Subcommand execution.

use crate::formatter::Formatter;
use anyhow::{Context, Result};
use clap::ValueEnum;
use crudql_core::compile::{CompiledQuery, DocumentBackend, QueryCompiler, QueryError};
use crudql_core::{CrudOperation, Dialect, QueryConfig, QueryValidator, RelationalBackend, SchemaBundle};
use crudql_proto::{Query, ValidationResult};
use serde_json::{json, Map, Value as Json};
use std::path::Path;
use tracing::{debug, info};

/// Target backend for `compile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Document-store filter documents
    Document,
    /// Parameterised SQL
    Relational,
}

/// Where `compile` emits to.
#[derive(Debug, Clone)]
pub struct CompileTarget {
    pub backend: BackendKind,
    pub dialect: Dialect,
    /// Table for relational output; defaults to the entity name.
    pub table: Option<String>,
}

impl CompileTarget {
    pub fn new(backend: BackendKind, dialect: Dialect, table: Option<String>) -> Self {
        Self {
            backend,
            dialect,
            table,
        }
    }
}

/// Printed output and whether the command succeeded.
#[derive(Debug)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl Outcome {
    fn passed(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }

    fn failed(output: String) -> Self {
        Self {
            output,
            success: false,
        }
    }
}

/// Load a schema from a JSON file.
pub fn load_schema(path: &Path) -> Result<SchemaBundle> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let schema = SchemaBundle::from_json(&json)
        .with_context(|| format!("invalid schema {}", path.display()))?;
    debug!(
        path = %path.display(),
        entities = schema.entities.len(),
        "loaded schema"
    );
    Ok(schema)
}

/// Load a query from a JSON file, or parse it inline when the argument is a
/// JSON object.
pub fn load_query(source: &str) -> Result<Query> {
    let json = if source.trim_start().starts_with('{') {
        source.to_string()
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read query {}", source))?
    };
    Query::from_json(&json).context("invalid query document")
}

/// Validate a query.
pub fn validate(
    schema: &SchemaBundle,
    config: &QueryConfig,
    entity: &str,
    query: &Query,
    formatter: &dyn Formatter,
) -> Outcome {
    let result = QueryValidator::new(schema, config).check(entity, query);
    info!(entity, valid = result.is_valid, "validated query");

    let output = formatter.format_validation(&result);
    if result.is_valid {
        Outcome::passed(output)
    } else {
        Outcome::failed(output)
    }
}

/// Validate a query, then compile it for `target`.
pub fn compile(
    schema: &SchemaBundle,
    config: &QueryConfig,
    entity: &str,
    query: &Query,
    target: &CompileTarget,
    formatter: &dyn Formatter,
) -> Result<Outcome> {
    match target.backend {
        BackendKind::Document => {
            let compiler = QueryCompiler::new(schema, config, DocumentBackend::new());
            match compiler.compile_checked(entity, query) {
                Ok(compiled) => Ok(Outcome::passed(
                    formatter.format_document(&document_json(&compiled)),
                )),
                Err(e) => rejected(e, formatter),
            }
        }
        BackendKind::Relational => {
            let compiler = QueryCompiler::new(schema, config, RelationalBackend::new(target.dialect));
            match compiler.compile_checked(entity, query) {
                Ok(compiled) => {
                    let fragment = compiler
                        .backend()
                        .select(target.table.as_deref().unwrap_or(entity), &compiled);
                    Ok(Outcome::passed(formatter.format_sql(&fragment)))
                }
                Err(e) => rejected(e, formatter),
            }
        }
    }
}

/// Check whether `entity` allows `operation`.
pub fn allows(
    schema: &SchemaBundle,
    entity: &str,
    operation: CrudOperation,
    formatter: &dyn Formatter,
) -> Result<Outcome> {
    let def = schema.entity(entity)?;
    let allowed = def.allows_operation(operation);
    let output = formatter.format_policy(&def.name, operation, allowed);
    Ok(if allowed {
        Outcome::passed(output)
    } else {
        Outcome::failed(output)
    })
}

/// User errors become a failed validation result; defects abort.
fn rejected(error: QueryError, formatter: &dyn Formatter) -> Result<Outcome> {
    if error.is_internal() {
        return Err(error.into());
    }
    let result = ValidationResult::invalid(error.to_string());
    Ok(Outcome::failed(formatter.format_validation(&result)))
}

fn document_json(compiled: &CompiledQuery<DocumentBackend>) -> Json {
    let sort: Vec<Json> = compiled
        .sort
        .iter()
        .map(|(path, direction)| {
            let mut key = Map::new();
            key.insert(path.clone(), json!(direction));
            Json::Object(key)
        })
        .collect();

    json!({
        "filter": compiled.filter,
        "sort": sort,
        "projection": compiled.projection,
        "limit": compiled.limit,
        "skip": compiled.skip,
    })
}
