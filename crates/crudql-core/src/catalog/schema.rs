//! Schema bundle - registry of every record type descriptor.

use super::EntityDef;
use crate::error::Error;
use crate::operation::CrudOperation;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::collections::HashMap;

/// A record type that can describe its own schema.
///
/// Implementations are written by hand or generated; registering them with
/// [`SchemaBundle::register`] replaces any need for runtime reflection.
pub trait Record {
    /// Descriptor of the record type itself.
    fn entity_def() -> EntityDef;

    /// Descriptors of the nested object types the record embeds.
    fn embedded_defs() -> Vec<EntityDef> {
        Vec::new()
    }
}

/// A versioned snapshot of every registered record type.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct SchemaBundle {
    /// Schema version (monotonically increasing).
    #[serde(default)]
    pub version: u64,
    /// Entity definitions keyed by name.
    #[serde(default)]
    pub entities: HashMap<String, EntityDef>,
}

impl SchemaBundle {
    /// Create an empty schema bundle.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entities: HashMap::new(),
        }
    }

    /// Add an entity to the schema.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Register a record type and the types it embeds.
    pub fn register<T: Record>(mut self) -> Self {
        for embedded in T::embedded_defs() {
            self.entities.insert(embedded.name.clone(), embedded);
        }
        let entity = T::entity_def();
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Get an entity by name.
    ///
    /// Exact names win; otherwise the first case-insensitive match is used.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name).or_else(|| {
            self.entities
                .values()
                .find(|e| e.name.eq_ignore_ascii_case(name))
        })
    }

    /// Get an entity by name or fail with [`Error::UnknownEntity`].
    pub fn entity(&self, name: &str) -> Result<&EntityDef, Error> {
        self.get_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }

    /// Check if `operation` is permitted on `entity`.
    ///
    /// Unknown entities permit nothing.
    pub fn allows_operation(&self, entity: &str, operation: CrudOperation) -> bool {
        self.get_entity(entity)
            .is_some_and(|e| e.allows_operation(operation))
    }

    /// Load a schema from its JSON description.
    ///
    /// Map keys are ignored in favor of each definition's own `name`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let parsed: SchemaBundle = serde_json::from_str(json)?;
        let entities = parsed
            .entities
            .into_values()
            .map(|e| (e.name.clone(), e))
            .collect();
        Ok(Self {
            version: parsed.version,
            entities,
        })
    }

    /// Serialize the schema bundle to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a schema bundle from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

impl Default for SchemaBundle {
    fn default() -> Self {
        Self::new(0)
    }
}
