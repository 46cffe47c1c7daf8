//! Property path resolution.
//!
//! Resolves a possibly nested, delimiter-joined field reference such as
//! `address.city` or `lineItems.sku` against an entity's schema. Composite
//! segments (embedded entities, or arrays of them) are resolved through the
//! [`SchemaBundle`]; a scalar segment cannot have children.

use crate::catalog::{EntityDef, FieldType, SchemaBundle};
use thiserror::Error;

/// Delimiter used when displaying a resolved path.
pub const DISPLAY_DELIMITER: &str = ".";

/// Structural problems with a field reference.
///
/// Anything else that fails to resolve is simply "not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment starts with the child delimiter.
    #[error("Field '{path}' is invalid: a path cannot begin with a delimiter.")]
    LeadingDelimiter {
        /// The full reference as requested.
        path: String,
    },

    /// A scalar segment was given children.
    #[error("Field '{path}' is invalid: '{segment}' of type {field_type} cannot have child properties.")]
    ScalarParent {
        /// The full reference as requested.
        path: String,
        /// Declared name of the scalar segment.
        segment: String,
        /// Type of the scalar segment.
        field_type: FieldType,
    },
}

/// One resolved segment of a property path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    /// Declared field name.
    pub name: String,
    /// External alias, if the field has one.
    pub alias: Option<String>,
    /// Static type of the field.
    pub field_type: FieldType,
}

/// A resolved, non-empty sequence of field segments.
///
/// Every segment except the last has a composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    fn single(segment: PathSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    fn prepend(mut self, segment: PathSegment) -> Self {
        self.segments.insert(0, segment);
        self
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The terminal segment.
    pub fn terminal(&self) -> &PathSegment {
        // Paths are only built from at least one segment.
        &self.segments[self.segments.len() - 1]
    }

    /// Declared name of the terminal field.
    pub fn name(&self) -> &str {
        &self.terminal().name
    }

    /// Static type of the terminal field.
    pub fn field_type(&self) -> &FieldType {
        &self.terminal().field_type
    }

    /// Check if the path crosses into a nested object.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Check if any segment, the terminal included, holds a collection.
    pub fn crosses_collection(&self) -> bool {
        self.segments.iter().any(|s| s.field_type.is_array())
    }

    /// Declared names joined with `separator`.
    pub fn join(&self, separator: &str) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Declared names joined with the display delimiter.
    pub fn display_name(&self) -> String {
        self.join(DISPLAY_DELIMITER)
    }

    /// Check if `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &PropertyPath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| a.name == b.name)
    }
}

/// Resolves field references against the schema.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    schema: &'a SchemaBundle,
    delimiter: &'a str,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver splitting child properties on `delimiter`.
    ///
    /// An empty delimiter disables nested resolution.
    pub fn new(schema: &'a SchemaBundle, delimiter: &'a str) -> Self {
        Self { schema, delimiter }
    }

    /// The schema this resolver reads from.
    pub fn schema(&self) -> &'a SchemaBundle {
        self.schema
    }

    /// Resolve `name` against `entity`.
    ///
    /// Returns `Ok(None)` when no such field exists.
    pub fn resolve(
        &self,
        entity: &EntityDef,
        name: &str,
    ) -> Result<Option<PropertyPath>, PathError> {
        self.resolve_from(entity, name, name)
    }

    fn resolve_from(
        &self,
        entity: &EntityDef,
        name: &str,
        full: &str,
    ) -> Result<Option<PropertyPath>, PathError> {
        let split = if self.delimiter.is_empty() {
            None
        } else {
            name.find(self.delimiter)
        };

        let Some(index) = split else {
            return Ok(entity.find_field(name).map(|f| {
                PropertyPath::single(PathSegment {
                    name: f.name.clone(),
                    alias: f.alias.clone(),
                    field_type: f.field_type.clone(),
                })
            }));
        };

        if index == 0 {
            return Err(PathError::LeadingDelimiter {
                path: full.to_string(),
            });
        }

        let (parent, rest) = (&name[..index], &name[index + self.delimiter.len()..]);
        let Some(field) = entity.find_field(parent) else {
            return Ok(None);
        };

        let Some(child_entity) = field.field_type.embedded_entity() else {
            return Err(PathError::ScalarParent {
                path: full.to_string(),
                segment: field.name.clone(),
                field_type: field.field_type.clone(),
            });
        };

        let Some(child) = self.schema.get_entity(child_entity) else {
            return Ok(None);
        };

        let segment = PathSegment {
            name: field.name.clone(),
            alias: field.alias.clone(),
            field_type: field.field_type.clone(),
        };
        Ok(self
            .resolve_from(child, rest, full)?
            .map(|path| path.prepend(segment)))
    }

    /// Check if `name` resolves against `entity`.
    pub fn has_field(&self, entity: &EntityDef, name: &str) -> bool {
        matches!(self.resolve(entity, name), Ok(Some(_)))
    }

    /// Check if every name resolves against `entity`.
    pub fn has_all_fields<I, S>(&self, entity: &EntityDef, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .all(|name| self.has_field(entity, name.as_ref()))
    }

    /// Every non-composite terminal path reachable from `entity`.
    ///
    /// Embedded types that (directly or indirectly) embed themselves are
    /// not expanded a second time.
    pub fn leaf_paths(&self, entity: &EntityDef) -> Vec<PropertyPath> {
        let mut out = Vec::new();
        let mut stack = vec![entity.name.clone()];
        self.collect_leaves(entity, &[], &mut stack, &mut out);
        out
    }

    fn collect_leaves(
        &self,
        entity: &EntityDef,
        prefix: &[PathSegment],
        stack: &mut Vec<String>,
        out: &mut Vec<PropertyPath>,
    ) {
        for field in &entity.fields {
            let mut segments = prefix.to_vec();
            segments.push(PathSegment {
                name: field.name.clone(),
                alias: field.alias.clone(),
                field_type: field.field_type.clone(),
            });

            match field
                .field_type
                .embedded_entity()
                .and_then(|name| self.schema.get_entity(name))
            {
                Some(child) if !stack.contains(&child.name) => {
                    stack.push(child.name.clone());
                    self.collect_leaves(child, &segments, stack, out);
                    stack.pop();
                }
                Some(_) => {}
                None => out.push(PropertyPath { segments }),
            }
        }
    }
}
