//! The merged, served entity descriptor.

use super::field::{EntityCallback, EntityField};
use super::relation::{EntityRelationManyToOne, EntityRelationOneToMany};
use super::types::{EntityCallbackType, EntityType};
use crate::error::Error;
use serde::Serialize;
use std::any::Any;
use std::fmt;

/// Everything the execution layer needs to map one entity type.
///
/// Instances are produced by the registry when metadata is first served and
/// are immutable afterwards; they are handed out as `Arc<EntityMetadata>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMetadata {
    /// Concrete entity type this metadata describes.
    pub entity_type: EntityType,
    /// Table name.
    pub table_name: String,
    /// Mapped fields, in declaration order.
    pub fields: Vec<EntityField>,
    /// Name of the primary key property.
    pub id_property_name: Option<String>,
    /// One-to-many relations owned by this entity.
    pub one_to_many_relations: Vec<EntityRelationOneToMany>,
    /// Many-to-one relations owned by this entity.
    pub many_to_one_relations: Vec<EntityRelationManyToOne>,
    /// Lifecycle callbacks.
    pub callbacks: Vec<EntityCallback>,
    /// Factory for new, empty instances.
    #[serde(skip)]
    pub create_entity: EntityFactory,
}

impl EntityMetadata {
    /// Create empty metadata for a type.
    pub fn new(entity_type: EntityType, table_name: impl Into<String>) -> Self {
        Self {
            entity_type,
            table_name: table_name.into(),
            fields: Vec::new(),
            id_property_name: None,
            one_to_many_relations: Vec::new(),
            many_to_one_relations: Vec::new(),
            callbacks: Vec::new(),
            create_entity: EntityFactory::new(entity_type),
        }
    }

    /// Get a field by property name.
    pub fn get_field(&self, property_name: &str) -> Option<&EntityField> {
        self.fields.iter().find(|f| f.property_name == property_name)
    }

    /// Get a field by column name.
    pub fn get_field_by_column(&self, column_name: &str) -> Option<&EntityField> {
        self.fields.iter().find(|f| f.column_name == column_name)
    }

    /// Get the primary key field.
    pub fn get_id_field(&self) -> Option<&EntityField> {
        self.id_property_name
            .as_deref()
            .and_then(|name| self.get_field(name))
    }

    /// Column backing the primary key.
    pub fn id_column_name(&self) -> Option<&str> {
        self.get_id_field().map(|f| f.column_name.as_str())
    }

    /// All column names, in field order.
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column_name.as_str()).collect()
    }

    /// Get the one-to-many relation declared on a property.
    pub fn get_one_to_many(&self, property_name: &str) -> Option<&EntityRelationOneToMany> {
        self.one_to_many_relations
            .iter()
            .find(|r| r.property_name == property_name)
    }

    /// Get the many-to-one relation declared on a property.
    pub fn get_many_to_one(&self, property_name: &str) -> Option<&EntityRelationManyToOne> {
        self.many_to_one_relations
            .iter()
            .find(|r| r.property_name == property_name)
    }

    /// Callbacks registered for one lifecycle point, in declaration order.
    pub fn callbacks_for(
        &self,
        callback_type: EntityCallbackType,
    ) -> impl Iterator<Item = &EntityCallback> {
        self.callbacks
            .iter()
            .filter(move |c| c.callback_type == callback_type)
    }

    /// Check if any relation is declared.
    pub fn has_relations(&self) -> bool {
        !self.one_to_many_relations.is_empty() || !self.many_to_one_relations.is_empty()
    }

    /// Serialize the metadata into a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, Error> {
        serde_json::to_value(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Creates new, empty instances of a mapped type.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EntityFactory {
    entity_type: EntityType,
}

impl EntityFactory {
    /// Factory for the given entity type.
    pub fn new(entity_type: EntityType) -> Self {
        Self { entity_type }
    }

    /// Create a type-erased instance.
    pub fn create(&self) -> Box<dyn Any + Send + Sync> {
        self.entity_type.create_instance()
    }

    /// Create an instance as `T`, or `None` if the factory builds another type.
    pub fn create_as<T: 'static>(&self) -> Option<T> {
        self.create().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Type produced by this factory.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }
}

impl fmt::Debug for EntityFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityFactory({})", self.entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[derive(Debug, Default, PartialEq)]
    struct Foo {
        foo_name: Option<String>,
    }

    impl Entity for Foo {}

    fn sample_metadata() -> EntityMetadata {
        let mut metadata = EntityMetadata::new(EntityType::of::<Foo>(), "foos");
        metadata.fields = vec![
            EntityField::new("fooId", "foo_id"),
            EntityField::new("fooName", "foo_name"),
        ];
        metadata.id_property_name = Some("fooId".into());
        metadata.callbacks = vec![
            EntityCallback::new("onPreRemove", EntityCallbackType::PreRemove),
            EntityCallback::new("onLoad", EntityCallbackType::PostLoad),
        ];
        metadata
    }

    #[test]
    fn test_lookups() {
        let metadata = sample_metadata();

        assert_eq!(metadata.get_field("fooName").unwrap().column_name, "foo_name");
        assert_eq!(metadata.get_field_by_column("foo_id").unwrap().property_name, "fooId");
        assert_eq!(metadata.id_column_name(), Some("foo_id"));
        assert_eq!(metadata.column_names(), vec!["foo_id", "foo_name"]);
        assert!(metadata.get_field("missing").is_none());
        assert!(!metadata.has_relations());
    }

    #[test]
    fn test_callbacks_for() {
        let metadata = sample_metadata();
        let pre_remove: Vec<_> = metadata
            .callbacks_for(EntityCallbackType::PreRemove)
            .collect();

        assert_eq!(pre_remove.len(), 1);
        assert_eq!(pre_remove[0].property_name, "onPreRemove");
    }

    #[test]
    fn test_factory_creates_empty_entity() {
        let metadata = sample_metadata();

        assert_eq!(metadata.create_entity.create_as::<Foo>(), Some(Foo::default()));
        assert!(metadata.create_entity.create_as::<String>().is_none());
    }

    #[test]
    fn test_to_json() {
        let json = sample_metadata().to_json().unwrap();

        assert_eq!(json["table_name"], "foos");
        assert_eq!(json["entity_type"], "Foo");
        assert_eq!(json["fields"][0]["column_name"], "foo_id");
        assert_eq!(json["fields"][0]["field_type"], "REGULAR");
        assert_eq!(json["callbacks"][0]["callback_type"], "PRE_REMOVE");
        assert!(json.get("create_entity").is_none());
    }
}
