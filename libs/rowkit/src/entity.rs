//! Entities and the class registry collaborator.
//!
//! An [`Entity`] is a class-tagged mapping from column name to JSON-safe
//! value, associated with exactly one table. It carries no connection state;
//! the session hands it to the row codec for reads and writes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::CodecError;

pub type JsonMap = serde_json::Map<String, Value>;

/// The `{class, data}` envelope exchanged with the registry collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub class: String,
    pub data: JsonMap,
}

/// A row instance, mutable only through explicit column sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    table: String,
    class: String,
    data: JsonMap,
}

impl Entity {
    pub fn new(table: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            class: class.into(),
            data: JsonMap::new(),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.data.insert(column.to_owned(), value.into());
    }

    /// Builder-style [`Entity::set`].
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// The primary key, if this entity has been assigned one.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.data.get("id").and_then(Value::as_i64)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    #[must_use]
    pub fn serialize(&self) -> Envelope {
        Envelope {
            class: self.class.clone(),
            data: self.data.clone(),
        }
    }
}

/// Resolves table names to entity classes and constructs typed entities from
/// decoded envelopes. Injected into the session at construction rather than
/// living as process-global state.
pub trait EntityRegistry: Send + Sync {
    fn class_for_table(&self, table: &str) -> Option<String>;

    /// Construct the typed entity for `table` from a decoded envelope.
    ///
    /// # Errors
    /// Returns a [`CodecError`] when the table is unregistered or the
    /// envelope's class does not match the registered one.
    fn deserialize(&self, table: &str, envelope: Envelope) -> Result<Entity, CodecError>;
}

/// Fixed table → class registry backed by an in-memory map.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    classes: HashMap<String, String>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(mut self, table: &str, class: &str) -> Self {
        self.classes.insert(table.to_owned(), class.to_owned());
        self
    }
}

impl EntityRegistry for StaticRegistry {
    fn class_for_table(&self, table: &str) -> Option<String> {
        self.classes.get(table).cloned()
    }

    fn deserialize(&self, table: &str, envelope: Envelope) -> Result<Entity, CodecError> {
        let expected = self
            .class_for_table(table)
            .ok_or_else(|| CodecError::UnregisteredTable(table.to_owned()))?;
        if expected != envelope.class {
            return Err(CodecError::ClassMismatch {
                table: table.to_owned(),
                expected,
                got: envelope.class,
            });
        }
        Ok(Entity {
            table: table.to_owned(),
            class: envelope.class,
            data: envelope.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_is_mutated_through_set_only() {
        let mut row = Entity::new("person", "Person").with("name", "Ada");
        assert_eq!(row.get("name"), Some(&Value::from("Ada")));
        assert_eq!(row.id(), None);

        row.set("id", 7);
        assert_eq!(row.id(), Some(7));
    }

    #[test]
    fn registry_resolves_and_deserializes() {
        let registry = StaticRegistry::new().register("person", "Person");
        assert_eq!(registry.class_for_table("person"), Some("Person".into()));
        assert_eq!(registry.class_for_table("ghost"), None);

        let row = Entity::new("person", "Person").with("age", 36);
        let back = registry.deserialize("person", row.serialize()).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn registry_rejects_class_mismatch() {
        let registry = StaticRegistry::new().register("person", "Person");
        let envelope = Envelope {
            class: "Animal".to_owned(),
            data: JsonMap::new(),
        };
        let err = registry.deserialize("person", envelope).unwrap_err();
        assert!(matches!(err, CodecError::ClassMismatch { .. }));
    }
}
