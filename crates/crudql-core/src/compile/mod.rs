//! Backend query compilation.
//!
//! A single recursive-descent driver, [`QueryCompiler`], walks the condition
//! tree, resolves every field through the [`PathResolver`] and coerces each
//! literal to the resolved field's type. What it emits is decided by a
//! [`QueryBackend`], which only supplies the native primitives:
//!
//! - [`DocumentBackend`] - JSON filter documents for document stores
//! - [`RelationalBackend`] - parameterised SQL predicates
//!
//! # Example
//!
//! ```
//! use crudql_core::catalog::{EntityDef, FieldDef, FieldType, ScalarType, SchemaBundle};
//! use crudql_core::compile::{DocumentBackend, QueryCompiler};
//! use crudql_core::config::QueryConfig;
//! use crudql_proto::{Condition, Query};
//!
//! let schema = SchemaBundle::new(1).with_entity(
//!     EntityDef::new("User", "Id")
//!         .with_field(FieldDef::new("Age", FieldType::scalar(ScalarType::Int32))),
//! );
//! let config = QueryConfig::default();
//! let compiler = QueryCompiler::new(&schema, &config, DocumentBackend::new());
//!
//! let query = Query::new().with_where(Condition::leaf("age", "GT", "18"));
//! let compiled = compiler.compile_checked("User", &query).unwrap();
//! assert_eq!(compiled.filter.unwrap(), serde_json::json!({"Age": {"$gt": 18}}));
//! ```

mod document;
mod error;
mod relational;

pub use document::DocumentBackend;
pub use error::{CompileError, CompileResult, QueryError};
pub use relational::{
    CompareOp, Dialect, PatternKind, RelationalBackend, SqlFragment, SqlOrder, SqlPredicate,
};

use crate::catalog::{EntityDef, SchemaBundle};
use crate::coercion::{coerce, coerce_all, pattern_text, CoercionError};
use crate::config::QueryConfig;
use crate::operators::{ComparisonOp, LogicalOp};
use crate::path::{PathResolver, PropertyPath};
use crate::validate::QueryValidator;
use crudql_proto::{Condition, FilterMap, GroupedCondition, Literal, Query, Value};
use std::fmt;
use tracing::{instrument, trace, warn};

/// The typed right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single coerced value.
    Single(Value),
    /// A set of coerced values (IN / NIN).
    Many(Vec<Value>),
    /// Raw text for a pattern operator.
    Pattern(String),
    /// No value: compares against null (EQ / NE only).
    Null,
}

/// A resolved sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// Field to sort by.
    pub path: PropertyPath,
    /// Sort direction.
    pub descending: bool,
}

/// A resolved projection.
///
/// Both forms carry every scalar terminal path of the entity so backends
/// that address flat columns can expand nested objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Return only these fields.
    Include {
        /// Fields to return.
        fields: Vec<PropertyPath>,
        /// Every scalar terminal path of the entity.
        leaves: Vec<PropertyPath>,
    },
    /// Return everything except these fields.
    Exclude {
        /// Fields to omit.
        fields: Vec<PropertyPath>,
        /// Every scalar terminal path of the entity.
        leaves: Vec<PropertyPath>,
    },
}

impl Projection {
    /// The requested fields.
    pub fn fields(&self) -> &[PropertyPath] {
        match self {
            Projection::Include { fields, .. } | Projection::Exclude { fields, .. } => fields,
        }
    }

    /// Scalar terminal paths selected by this projection.
    pub fn selected_leaves(&self) -> Vec<PropertyPath> {
        match self {
            Projection::Include { fields, leaves } => fields
                .iter()
                .flat_map(|field| {
                    if field.field_type().is_composite() {
                        leaves
                            .iter()
                            .filter(|leaf| leaf.starts_with(field))
                            .cloned()
                            .collect()
                    } else {
                        vec![field.clone()]
                    }
                })
                .collect(),
            Projection::Exclude { fields, leaves } => leaves
                .iter()
                .filter(|leaf| !fields.iter().any(|field| leaf.starts_with(field)))
                .cloned()
                .collect(),
        }
    }
}

/// Native primitives of a persistence backend.
pub trait QueryBackend: fmt::Debug {
    /// Native filter expression.
    type Predicate: Clone + fmt::Debug;
    /// Native sort specification.
    type Sort: Clone + fmt::Debug;
    /// Native projection.
    type Projection: Clone + fmt::Debug;

    /// Backend name used in diagnostics.
    const NAME: &'static str;

    /// Check if the backend implements `op`.
    fn supports(&self, op: ComparisonOp) -> bool {
        let _ = op;
        true
    }

    /// Check that the backend can address `path`.
    ///
    /// Called for every field a request names: conditions, filter maps, sort
    /// keys and projections.
    fn check_path(&self, path: &PropertyPath) -> CompileResult<()> {
        let _ = path;
        Ok(())
    }

    /// Compile one comparison.
    fn compile_leaf(
        &self,
        path: &PropertyPath,
        op: ComparisonOp,
        operand: Operand,
    ) -> CompileResult<Self::Predicate>;

    /// Combine compiled children with a logical operator.
    fn compile_group(&self, op: LogicalOp, children: Vec<Self::Predicate>) -> Self::Predicate;

    /// Compile sort keys, preserving their order.
    fn compile_sort(&self, keys: &[SortKey]) -> Self::Sort;

    /// Compile a projection.
    fn compile_projection(&self, projection: &Projection) -> Self::Projection;
}

/// A query compiled for backend `B`.
#[derive(Debug, Clone)]
pub struct CompiledQuery<B: QueryBackend> {
    /// Filter, or `None` to match every record.
    pub filter: Option<B::Predicate>,
    /// Sort specification (empty when unsorted).
    pub sort: B::Sort,
    /// Projection, or `None` for whole records.
    pub projection: Option<B::Projection>,
    /// Maximum number of records.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub skip: Option<u64>,
}

/// Compiles requests for one backend.
#[derive(Debug, Clone)]
pub struct QueryCompiler<'a, B> {
    schema: &'a SchemaBundle,
    config: &'a QueryConfig,
    backend: B,
}

impl<'a, B: QueryBackend> QueryCompiler<'a, B> {
    /// Create a compiler.
    pub fn new(schema: &'a SchemaBundle, config: &'a QueryConfig, backend: B) -> Self {
        Self {
            schema,
            config,
            backend,
        }
    }

    /// The backend this compiler emits for.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn resolver(&self) -> PathResolver<'a> {
        PathResolver::new(self.schema, &self.config.child_delimiter)
    }

    fn entity(&self, name: &str) -> CompileResult<&'a EntityDef> {
        self.schema
            .get_entity(name)
            .ok_or_else(|| CompileError::UnknownEntity(name.to_string()))
    }

    fn resolve(&self, entity: &EntityDef, field: &str) -> CompileResult<PropertyPath> {
        let path = self
            .resolver()
            .resolve(entity, field)?
            .ok_or_else(|| CompileError::UnknownField(field.to_string()))?;
        self.backend.check_path(&path)?;
        Ok(path)
    }

    /// Validate `query`, then compile it.
    pub fn compile_checked(
        &self,
        entity: &str,
        query: &Query,
    ) -> Result<CompiledQuery<B>, QueryError> {
        QueryValidator::new(self.schema, self.config).validate_query(entity, query)?;
        Ok(self.compile_query(entity, query)?)
    }

    /// Validate a filter map, then compile it.
    pub fn compile_filter_checked(
        &self,
        entity: &str,
        filter: &FilterMap,
    ) -> Result<B::Predicate, QueryError> {
        QueryValidator::new(self.schema, self.config).validate_filter(entity, filter)?;
        Ok(self.compile_filter_map(entity, filter)?)
    }

    /// Compile a query that has already been validated.
    #[instrument(level = "debug", skip(self, query), fields(backend = B::NAME))]
    pub fn compile_query(&self, entity: &str, query: &Query) -> CompileResult<CompiledQuery<B>> {
        let def = self.entity(entity)?;

        let filter = query
            .condition
            .as_ref()
            .map(|c| self.condition(def, c))
            .transpose()?;

        let keys = query
            .order_by
            .iter()
            .map(|sort| {
                let field = sort
                    .field
                    .as_deref()
                    .ok_or_else(|| CompileError::Malformed("sort key has no field".into()))?;
                Ok(SortKey {
                    path: self.resolve(def, field)?,
                    descending: sort.descending(),
                })
            })
            .collect::<CompileResult<Vec<_>>>()?;

        let projection = self
            .projection(def, query)?
            .map(|p| self.backend.compile_projection(&p));

        Ok(CompiledQuery {
            filter,
            sort: self.backend.compile_sort(&keys),
            projection,
            limit: non_negative("limit", query.limit)?,
            skip: non_negative("skip", query.skip)?,
        })
    }

    /// Compile a condition tree.
    ///
    /// A composite root combines its groups with AND.
    pub fn compile_condition(
        &self,
        entity: &str,
        condition: &Condition,
    ) -> CompileResult<B::Predicate> {
        let def = self.entity(entity)?;
        self.condition(def, condition)
    }

    /// Compile a `{field: value}` filter map into an AND of equalities.
    #[instrument(level = "debug", skip(self, filter), fields(backend = B::NAME))]
    pub fn compile_filter_map(
        &self,
        entity: &str,
        filter: &FilterMap,
    ) -> CompileResult<B::Predicate> {
        let def = self.entity(entity)?;
        let children = filter
            .iter()
            .map(|(field, value)| {
                let path = self.resolve(def, field)?;
                let operand = self.operand(&path, field, ComparisonOp::Eq, value.as_ref(), None)?;
                self.emit(&path, ComparisonOp::Eq, operand)
            })
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(self.backend.compile_group(LogicalOp::And, children))
    }

    fn projection(&self, entity: &EntityDef, query: &Query) -> CompileResult<Option<Projection>> {
        let resolve_all = |fields: &[String]| {
            fields
                .iter()
                .map(|f| self.resolve(entity, f))
                .collect::<CompileResult<Vec<_>>>()
        };

        if !query.includes.is_empty() {
            return Ok(Some(Projection::Include {
                fields: resolve_all(&query.includes)?,
                leaves: self.resolver().leaf_paths(entity),
            }));
        }
        if !query.excludes.is_empty() {
            return Ok(Some(Projection::Exclude {
                fields: resolve_all(&query.excludes)?,
                leaves: self.resolver().leaf_paths(entity),
            }));
        }
        Ok(None)
    }

    fn condition(&self, entity: &EntityDef, condition: &Condition) -> CompileResult<B::Predicate> {
        match (&condition.field, &condition.grouped_conditions) {
            (Some(field), None) => self.leaf(entity, field, condition),
            (None, Some(groups)) => {
                let children = groups
                    .iter()
                    .map(|group| match group {
                        Some(group) => self.group(entity, group),
                        None => Err(CompileError::Malformed("null grouped condition".into())),
                    })
                    .collect::<CompileResult<Vec<_>>>()?;
                if children.is_empty() {
                    return Err(CompileError::Malformed("empty groupedConditions".into()));
                }
                Ok(self.backend.compile_group(LogicalOp::And, children))
            }
            _ => Err(CompileError::Malformed(
                "condition must contain either a field or groupedConditions".into(),
            )),
        }
    }

    fn group(&self, entity: &EntityDef, group: &GroupedCondition) -> CompileResult<B::Predicate> {
        let op = match &group.logical_operator {
            Some(name) => {
                LogicalOp::parse(name).ok_or_else(|| CompileError::UnknownOperator(name.clone()))?
            }
            None => LogicalOp::And,
        };

        let children = group
            .conditions
            .iter()
            .map(|condition| match condition {
                Some(condition) => self.condition(entity, condition),
                None => Err(CompileError::Malformed("null condition".into())),
            })
            .collect::<CompileResult<Vec<_>>>()?;
        if children.is_empty() {
            return Err(CompileError::Malformed("empty grouped condition".into()));
        }

        Ok(self.backend.compile_group(op, children))
    }

    fn leaf(
        &self,
        entity: &EntityDef,
        field: &str,
        condition: &Condition,
    ) -> CompileResult<B::Predicate> {
        let operator = condition
            .comparison_operator
            .as_deref()
            .ok_or_else(|| CompileError::Malformed(format!("field '{}' has no operator", field)))?;
        let op = ComparisonOp::parse(operator)
            .ok_or_else(|| CompileError::UnknownOperator(operator.to_string()))?;
        let path = self.resolve(entity, field)?;

        let operand = self.operand(
            &path,
            field,
            op,
            condition.value.as_ref(),
            Some(condition.values.as_slice()),
        )?;
        self.emit(&path, op, operand)
    }

    fn emit(
        &self,
        path: &PropertyPath,
        op: ComparisonOp,
        operand: Operand,
    ) -> CompileResult<B::Predicate> {
        if !self.backend.supports(op) {
            warn!(backend = B::NAME, operator = %op, "operator not implemented by backend");
            return Err(CompileError::Unsupported {
                backend: B::NAME,
                operator: op,
            });
        }
        trace!(field = %path.display_name(), operator = %op, "compiled leaf");
        self.backend.compile_leaf(path, op, operand)
    }

    fn operand(
        &self,
        path: &PropertyPath,
        field: &str,
        op: ComparisonOp,
        value: Option<&Literal>,
        values: Option<&[Literal]>,
    ) -> CompileResult<Operand> {
        let field_type = path.field_type();

        if op.is_multi_value() {
            let values = match (values, value) {
                (Some(values), _) if !values.is_empty() => coerce_all(field, field_type, values)?,
                (_, Some(value)) => vec![coerce(field, field_type, value)?],
                _ => Vec::new(),
            };
            return Ok(Operand::Many(values));
        }

        let Some(value) = value else {
            return match op {
                ComparisonOp::Eq | ComparisonOp::Ne => Ok(Operand::Null),
                _ => Err(CoercionError::MissingValue {
                    field: field.to_string(),
                    operator: op,
                }
                .into()),
            };
        };

        if op.is_pattern() {
            return Ok(Operand::Pattern(pattern_text(field, field_type, op, value)?));
        }

        Ok(Operand::Single(coerce(field, field_type, value)?))
    }
}

fn non_negative(name: &str, value: Option<i64>) -> CompileResult<Option<u64>> {
    value
        .map(|v| {
            u64::try_from(v)
                .map_err(|_| CompileError::Malformed(format!("{} cannot be less than zero", name)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, FieldType, ScalarType};
    use crudql_proto::Sort;

    /// Renders predicates as readable strings.
    #[derive(Debug, Clone, Default)]
    struct Echo {
        refuse: Option<ComparisonOp>,
    }

    impl QueryBackend for Echo {
        type Predicate = String;
        type Sort = Vec<String>;
        type Projection = String;

        const NAME: &'static str = "echo";

        fn supports(&self, op: ComparisonOp) -> bool {
            self.refuse != Some(op)
        }

        fn compile_leaf(
            &self,
            path: &PropertyPath,
            op: ComparisonOp,
            operand: Operand,
        ) -> CompileResult<String> {
            let rhs = match operand {
                Operand::Single(v) => v.to_string(),
                Operand::Many(vs) => format!(
                    "[{}]",
                    vs.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
                ),
                Operand::Pattern(p) => format!("/{}/", p),
                Operand::Null => "null".to_string(),
            };
            Ok(format!("{} {} {}", path.display_name(), op, rhs))
        }

        fn compile_group(&self, op: LogicalOp, children: Vec<String>) -> String {
            format!("{}({})", op, children.join(", "))
        }

        fn compile_sort(&self, keys: &[SortKey]) -> Vec<String> {
            keys.iter()
                .map(|k| format!("{}{}", if k.descending { "-" } else { "+" }, k.path.display_name()))
                .collect()
        }

        fn compile_projection(&self, projection: &Projection) -> String {
            match projection {
                Projection::Include { fields, .. } => format!(
                    "only {}",
                    fields.iter().map(|p| p.display_name()).collect::<Vec<_>>().join(",")
                ),
                Projection::Exclude { fields, leaves } => format!(
                    "without {} of {}",
                    fields.iter().map(|p| p.display_name()).collect::<Vec<_>>().join(","),
                    leaves.len()
                ),
            }
        }
    }

    fn schema() -> SchemaBundle {
        let address = EntityDef::new("Address", "City")
            .with_field(FieldDef::new("City", FieldType::scalar(ScalarType::String)));
        let user = EntityDef::new("User", "Id")
            .with_field(FieldDef::new("Id", FieldType::scalar(ScalarType::Int32)))
            .with_field(FieldDef::new("Name", FieldType::scalar(ScalarType::String)))
            .with_field(FieldDef::optional("Age", FieldType::optional_scalar(ScalarType::Int32)))
            .with_field(FieldDef::new("Address", FieldType::embedded("Address")));
        SchemaBundle::new(1).with_entity(address).with_entity(user)
    }

    fn compile(condition: Condition) -> CompileResult<String> {
        let schema = schema();
        let config = QueryConfig::default();
        QueryCompiler::new(&schema, &config, Echo::default()).compile_condition("User", &condition)
    }

    #[test]
    fn test_leaf() {
        assert_eq!(compile(Condition::leaf("age", ">", "18")).unwrap(), "Age GT 18");
    }

    #[test]
    fn test_root_group_defaults_to_and() {
        let condition = Condition::grouped(vec![GroupedCondition::or(vec![
            Condition::leaf("Id", "EQ", "1"),
            Condition::leaf("Id", "EQ", "2"),
        ])]);
        assert_eq!(compile(condition).unwrap(), "AND(OR(Id EQ 1, Id EQ 2))");

        let implicit = Condition::grouped(vec![GroupedCondition::implicit(vec![
            Condition::leaf("Id", "EQ", "1"),
            Condition::leaf("Name", "EQ", "x"),
        ])]);
        assert_eq!(compile(implicit).unwrap(), "AND(AND(Id EQ 1, Name EQ x))");
    }

    #[test]
    fn test_multi_value_operands() {
        let condition = Condition::multi("Id", "in", vec!["1".into(), Literal::Integer(2)]);
        assert_eq!(compile(condition).unwrap(), "Id IN [1,2]");

        let single = Condition::leaf("Id", "NIN", "3");
        assert_eq!(compile(single).unwrap(), "Id NIN [3]");

        let empty = Condition::null("Id", "IN");
        assert_eq!(compile(empty).unwrap(), "Id IN []");
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(compile(Condition::null("Age", "EQ")).unwrap(), "Age EQ null");
        assert_eq!(compile(Condition::null("Age", "!=")).unwrap(), "Age NE null");
        assert!(matches!(
            compile(Condition::null("Age", "GT")),
            Err(CompileError::Coercion(CoercionError::MissingValue { .. }))
        ));
    }

    #[test]
    fn test_pattern_operand() {
        assert_eq!(
            compile(Condition::leaf("address.city", "like", "ber")).unwrap(),
            "Address.City CONTAINS /ber/"
        );
        assert!(matches!(
            compile(Condition::leaf("Id", "STARTSWITH", "1")),
            Err(CompileError::Coercion(CoercionError::NonTextPattern { .. }))
        ));
    }

    #[test]
    fn test_coercion_failure() {
        let err = compile(Condition::leaf("Age", "GT", "old")).unwrap_err();
        assert!(!err.is_internal());
        assert!(matches!(err, CompileError::Coercion(CoercionError::Invalid { .. })));
    }

    #[test]
    fn test_unsupported_operator_is_internal() {
        let schema = schema();
        let config = QueryConfig::default();
        let backend = Echo {
            refuse: Some(ComparisonOp::EndsWith),
        };
        let err = QueryCompiler::new(&schema, &config, backend)
            .compile_condition("User", &Condition::leaf("Name", "endswith", "x"))
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::Unsupported {
                backend: "echo",
                operator: ComparisonOp::EndsWith,
            }
        );
        assert!(err.is_internal());
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(
            compile(Condition::leaf("Height", "EQ", "1")),
            Err(CompileError::UnknownField("Height".into()))
        );
        assert_eq!(
            compile(Condition::leaf("Id", "around", "1")),
            Err(CompileError::UnknownOperator("around".into()))
        );
    }

    #[test]
    fn test_compile_query_parts() {
        let schema = schema();
        let config = QueryConfig::default();
        let compiler = QueryCompiler::new(&schema, &config, Echo::default());
        let query = Query::new()
            .with_excludes(vec!["address.city".into()])
            .with_order(Sort::desc("Age"))
            .with_order(Sort::asc("name"))
            .with_limit(10)
            .with_skip(20);

        let compiled = compiler.compile_checked("User", &query).unwrap();
        assert!(compiled.filter.is_none());
        assert_eq!(compiled.sort, vec!["-Age", "+Name"]);
        assert_eq!(compiled.projection.as_deref(), Some("without Address.City of 4"));
        assert_eq!(compiled.limit, Some(10));
        assert_eq!(compiled.skip, Some(20));
    }

    #[test]
    fn test_compile_checked_validates_first() {
        let schema = schema();
        let config = QueryConfig::default();
        let compiler = QueryCompiler::new(&schema, &config, Echo::default());

        let err = compiler
            .compile_checked("User", &Query::new().with_limit(-1))
            .unwrap_err();
        assert!(matches!(err, QueryError::Invalid(_)));
        assert_eq!(err.to_string(), "Limit cannot be less than zero.");
    }

    #[test]
    fn test_filter_map() {
        let schema = schema();
        let config = QueryConfig::default();
        let compiler = QueryCompiler::new(&schema, &config, Echo::default());

        let mut filter = FilterMap::new();
        filter.insert("Name".into(), Some("Ada".into()));
        filter.insert("Age".into(), None);
        assert_eq!(
            compiler.compile_filter_checked("User", &filter).unwrap(),
            "AND(Age EQ null, Name EQ Ada)"
        );

        assert!(matches!(
            compiler.compile_filter_checked("User", &FilterMap::new()),
            Err(QueryError::Invalid(_))
        ));
    }
}
