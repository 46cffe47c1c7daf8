//! Entity definitions.

use super::field::FieldDef;
use crate::operation::{allows_operation, CrudOperation};
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// An entity definition (record type schema).
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct EntityDef {
    /// Entity name (unique within schema).
    pub name: String,
    /// Name of the primary identity field.
    pub identity_field: String,
    /// Field definitions.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Denied CRUD operations; `None` when the type carries no denylist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied_operations: Option<Vec<CrudOperation>>,
}

impl EntityDef {
    /// Create a new entity definition.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            fields: Vec::new(),
            denied_operations: None,
        }
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Deny the given operations (and everything they encompass).
    pub fn deny_operations(mut self, ops: impl IntoIterator<Item = CrudOperation>) -> Self {
        self.denied_operations
            .get_or_insert_with(Vec::new)
            .extend(ops);
        self
    }

    /// Block every operation on this entity.
    pub fn block_all_operations(mut self) -> Self {
        self.denied_operations = Some(Vec::new());
        self
    }

    /// Get a field by exact declared name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a field by request name (declared name or alias, ignoring case).
    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.matches_name(name)))
    }

    /// Get the identity field definition.
    pub fn get_identity_field(&self) -> Option<&FieldDef> {
        self.get_field(&self.identity_field)
    }

    /// Check if `operation` is permitted on this entity.
    pub fn allows_operation(&self, operation: CrudOperation) -> bool {
        allows_operation(self.denied_operations.as_deref(), operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, ScalarType};

    fn user() -> EntityDef {
        EntityDef::new("User", "id")
            .with_field(FieldDef::new("id", FieldType::scalar(ScalarType::Uuid)))
            .with_field(
                FieldDef::new("name", FieldType::scalar(ScalarType::String))
                    .with_alias("displayName"),
            )
            .with_field(FieldDef::optional(
                "email",
                FieldType::scalar(ScalarType::String),
            ))
    }

    #[test]
    fn test_entity_builder() {
        let entity = user();
        assert_eq!(entity.name, "User");
        assert_eq!(entity.identity_field, "id");
        assert_eq!(entity.fields.len(), 3);
        assert!(entity.get_identity_field().is_some());
    }

    #[test]
    fn test_find_field() {
        let entity = user();
        assert!(entity.get_field("name").is_some());
        assert!(entity.get_field("Name").is_none());
        assert_eq!(entity.find_field("Name").unwrap().name, "name");
        assert_eq!(entity.find_field("DISPLAYNAME").unwrap().name, "name");
        assert!(entity.find_field("nonexistent").is_none());
    }

    #[test]
    fn test_operation_denylist() {
        let open = user();
        assert!(open.allows_operation(CrudOperation::DeleteByQuery));

        let read_only = user().deny_operations([
            CrudOperation::Create,
            CrudOperation::Update,
            CrudOperation::PartialUpdate,
            CrudOperation::Delete,
        ]);
        assert!(read_only.allows_operation(CrudOperation::ReadByQuery));
        assert!(!read_only.allows_operation(CrudOperation::DeleteById));
        assert!(!read_only.allows_operation(CrudOperation::PartialUpdateByFilter));

        let sealed = user().block_all_operations();
        assert!(!sealed.allows_operation(CrudOperation::Read));
    }
}
