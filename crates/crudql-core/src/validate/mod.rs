//! Query validation.
//!
//! The [`QueryValidator`] checks a request against the schema, per-field
//! policies and the global [`QueryConfig`] before anything is compiled.
//! Checks run in a fixed order and stop at the first violation:
//!
//! 1. `includes` and `excludes` are mutually exclusive
//! 2. every projected field resolves
//! 3. the `where` tree is well formed, resolves and is permitted
//! 4. every sort key names a field that resolves
//! 5. `limit` and `skip` are not negative

mod error;

pub use error::{FieldLocation, OperatorKind, PolicyOrigin, ValidationError};

use crate::catalog::{EntityDef, SchemaBundle};
use crate::config::QueryConfig;
use crate::operators::{ComparisonOp, LogicalOp};
use crate::path::{PathResolver, PropertyPath};
use crudql_proto::{Condition, FilterMap, GroupedCondition, Query, Sort, ValidationResult};
use tracing::{debug, instrument};

/// Validates requests against a schema and configuration.
#[derive(Debug, Clone, Copy)]
pub struct QueryValidator<'a> {
    schema: &'a SchemaBundle,
    config: &'a QueryConfig,
}

impl<'a> QueryValidator<'a> {
    /// Create a validator.
    pub fn new(schema: &'a SchemaBundle, config: &'a QueryConfig) -> Self {
        Self { schema, config }
    }

    fn resolver(&self) -> PathResolver<'a> {
        PathResolver::new(self.schema, &self.config.child_delimiter)
    }

    fn entity(&self, name: &str) -> Result<&'a EntityDef, ValidationError> {
        self.schema
            .get_entity(name)
            .ok_or_else(|| ValidationError::UnknownEntity(name.to_string()))
    }

    /// Validate a full query against `entity`.
    #[instrument(level = "debug", skip(self, query))]
    pub fn validate_query(&self, entity: &str, query: &Query) -> Result<(), ValidationError> {
        let result = self.entity(entity).and_then(|def| self.check_query(def, query));
        if let Err(e) = &result {
            debug!(entity, error = %e, "query rejected");
        }
        result
    }

    /// Validate a query and wrap the outcome for callers.
    pub fn check(&self, entity: &str, query: &Query) -> ValidationResult {
        self.validate_query(entity, query).into()
    }

    /// Validate a single condition tree against `entity`.
    pub fn validate_condition(
        &self,
        entity: &str,
        condition: &Condition,
    ) -> Result<(), ValidationError> {
        let def = self.entity(entity)?;
        self.check_condition(def, condition, 1)
    }

    /// Validate the filter map of a `ByFilter` operation.
    ///
    /// An empty filter would match every record and is refused.
    #[instrument(level = "debug", skip(self, filter))]
    pub fn validate_filter(&self, entity: &str, filter: &FilterMap) -> Result<(), ValidationError> {
        let result = self.entity(entity).and_then(|def| {
            if filter.is_empty() {
                return Err(ValidationError::EmptyFilter);
            }
            for field in filter.keys() {
                self.resolve(def, field, FieldLocation::Filter)?;
            }
            Ok(())
        });
        if let Err(e) = &result {
            debug!(entity, error = %e, "filter rejected");
        }
        result
    }

    /// Validate the property list of a partial update.
    #[instrument(level = "debug", skip(self, properties))]
    pub fn validate_partial_update<S: AsRef<str>>(
        &self,
        entity: &str,
        properties: &[S],
    ) -> Result<(), ValidationError> {
        let result = self.entity(entity).and_then(|def| {
            if properties.is_empty() {
                return Err(ValidationError::EmptyUpdate);
            }
            for property in properties {
                self.resolve(def, property.as_ref(), FieldLocation::Update)?;
            }
            Ok(())
        });
        if let Err(e) = &result {
            debug!(entity, error = %e, "partial update rejected");
        }
        result
    }

    fn check_query(&self, entity: &EntityDef, query: &Query) -> Result<(), ValidationError> {
        if !query.includes.is_empty() && !query.excludes.is_empty() {
            return Err(ValidationError::structural(
                "Invalid query: Includes and Excludes cannot both be populated.",
            ));
        }

        for field in &query.includes {
            self.resolve(entity, field, FieldLocation::Includes)?;
        }
        for field in &query.excludes {
            self.resolve(entity, field, FieldLocation::Excludes)?;
        }

        if let Some(condition) = &query.condition {
            self.check_condition(entity, condition, 1)?;
        }

        for sort in &query.order_by {
            self.check_sort(entity, sort)?;
        }

        if query.limit.is_some_and(|limit| limit < 0) {
            return Err(ValidationError::Range(
                "Limit cannot be less than zero.".to_string(),
            ));
        }
        if query.skip.is_some_and(|skip| skip < 0) {
            return Err(ValidationError::Range(
                "Skip cannot be less than zero.".to_string(),
            ));
        }

        Ok(())
    }

    fn check_sort(&self, entity: &EntityDef, sort: &Sort) -> Result<(), ValidationError> {
        let Some(field) = &sort.field else {
            return Err(ValidationError::structural(
                "OrderBy entries must specify a field.",
            ));
        };
        self.resolve(entity, field, FieldLocation::OrderBy)?;
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), ValidationError> {
        match self.config.max_condition_depth {
            Some(max) if depth > max => Err(ValidationError::structural(format!(
                "Condition nesting exceeds the maximum depth of {}.",
                max
            ))),
            _ => Ok(()),
        }
    }

    fn check_condition(
        &self,
        entity: &EntityDef,
        condition: &Condition,
        depth: usize,
    ) -> Result<(), ValidationError> {
        self.check_depth(depth)?;

        match (&condition.field, &condition.grouped_conditions) {
            (None, None) => Err(ValidationError::structural(
                "Condition must contain either a field or groupedConditions.",
            )),
            (Some(_), Some(_)) => Err(ValidationError::structural(
                "Condition cannot contain both a field and groupedConditions.",
            )),
            (Some(field), None) => self.check_leaf(entity, field, condition),
            (None, Some(groups)) => {
                if condition.comparison_operator.is_some() {
                    return Err(ValidationError::structural(
                        "Condition with groupedConditions cannot specify a comparisonOperator.",
                    ));
                }
                if groups.is_empty() {
                    return Err(ValidationError::structural(
                        "GroupedConditions cannot be empty.",
                    ));
                }
                for group in groups {
                    let Some(group) = group else {
                        return Err(ValidationError::structural(
                            "GroupedConditions cannot contain null entries.",
                        ));
                    };
                    self.check_group(entity, group, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    fn check_group(
        &self,
        entity: &EntityDef,
        group: &GroupedCondition,
        depth: usize,
    ) -> Result<(), ValidationError> {
        if let Some(op) = &group.logical_operator {
            if LogicalOp::parse(op).is_none() {
                return Err(ValidationError::UnknownOperator {
                    kind: OperatorKind::Logical,
                    operator: op.clone(),
                });
            }
        }

        if group.conditions.is_empty() {
            return Err(ValidationError::structural(
                "A grouped condition must contain at least one condition.",
            ));
        }

        for condition in &group.conditions {
            let Some(condition) = condition else {
                return Err(ValidationError::structural(
                    "Conditions cannot contain null entries.",
                ));
            };
            self.check_condition(entity, condition, depth)?;
        }
        Ok(())
    }

    fn check_leaf(
        &self,
        entity: &EntityDef,
        field: &str,
        condition: &Condition,
    ) -> Result<(), ValidationError> {
        let path = self.resolve(entity, field, FieldLocation::Condition)?;

        let Some(operator) = &condition.comparison_operator else {
            return Err(ValidationError::structural(format!(
                "Condition on field '{}' must specify a comparisonOperator.",
                field
            )));
        };
        let op = ComparisonOp::parse(operator).ok_or_else(|| ValidationError::UnknownOperator {
            kind: OperatorKind::Comparison,
            operator: operator.clone(),
        })?;

        if self.config.is_globally_disabled(op) {
            return Err(ValidationError::PolicyViolation {
                field: field.to_string(),
                operator: op,
                origin: PolicyOrigin::Configuration,
            });
        }
        if self.field_disallows(entity, &path, op) {
            return Err(ValidationError::PolicyViolation {
                field: field.to_string(),
                operator: op,
                origin: PolicyOrigin::Field,
            });
        }

        if op.is_pattern() {
            if let Some(value) = &condition.value {
                if !is_letters_and_digits(&value.as_text()) {
                    return Err(ValidationError::PatternValue {
                        field: field.to_string(),
                        operator: op,
                    });
                }
            }
        }

        Ok(())
    }

    /// Check the policy of the terminal field of `path`.
    fn field_disallows(&self, entity: &EntityDef, path: &PropertyPath, op: ComparisonOp) -> bool {
        let mut current = entity;
        for (i, segment) in path.segments().iter().enumerate() {
            let Some(def) = current.get_field(&segment.name) else {
                return false;
            };
            if i + 1 == path.segments().len() {
                return def.disallows(op);
            }
            match def
                .field_type
                .embedded_entity()
                .and_then(|name| self.schema.get_entity(name))
            {
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }

    fn resolve(
        &self,
        entity: &EntityDef,
        field: &str,
        location: FieldLocation,
    ) -> Result<PropertyPath, ValidationError> {
        self.resolver()
            .resolve(entity, field)?
            .ok_or_else(|| ValidationError::UnknownField {
                location,
                field: field.to_string(),
            })
    }
}

fn is_letters_and_digits(text: &str) -> bool {
    text.chars().all(char::is_alphanumeric)
}
