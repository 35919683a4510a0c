//! Core type definitions for entity metadata.

use crate::entity::Entity;
use crate::error::Error;
use crate::registry::MetadataRegistry;
use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a mapped entity type.
///
/// Keyed by [`TypeId`], so two same-named types from different modules never
/// collide. The type name is only carried for diagnostics.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
    register: fn(&MetadataRegistry) -> Result<(), Error>,
    create: fn() -> Box<dyn Any + Send + Sync>,
}

impl EntityType {
    /// Identity of the entity type `T`.
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            register: |registry| registry.register::<T>(),
            create: || Box::new(T::default()) as Box<dyn Any + Send + Sync>,
        }
    }

    /// Get the type identifier.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Full Rust type name, as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Check whether this is the identity of `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Run the type's own declarations against `registry`.
    pub(crate) fn register_in(&self, registry: &MetadataRegistry) -> Result<(), Error> {
        (self.register)(registry)
    }

    pub(crate) fn create_instance(&self) -> Box<dyn Any + Send + Sync> {
        (self.create)()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityType").field(&self.name).finish()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_name())
    }
}

/// How a field maps onto its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityFieldType {
    /// Plain column holding a scalar value.
    #[default]
    Regular,
    /// Foreign-key column holding a reference to another entity.
    JoinedEntity,
}

/// Lifecycle points at which the execution layer invokes callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCallbackType {
    /// Before an entity is inserted.
    PrePersist,
    /// After an entity is inserted.
    PostPersist,
    /// Before an entity is updated.
    PreUpdate,
    /// After an entity is updated.
    PostUpdate,
    /// Before an entity is removed.
    PreRemove,
    /// After an entity is removed.
    PostRemove,
    /// After an entity is hydrated from a row.
    PostLoad,
}

impl fmt::Display for EntityCallbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PrePersist => "PRE_PERSIST",
            Self::PostPersist => "POST_PERSIST",
            Self::PreUpdate => "PRE_UPDATE",
            Self::PostUpdate => "POST_UPDATE",
            Self::PreRemove => "PRE_REMOVE",
            Self::PostRemove => "POST_REMOVE",
            Self::PostLoad => "POST_LOAD",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Widget;

    impl Entity for Widget {}

    mod other {
        #[derive(Default)]
        pub struct Widget;

        impl crate::entity::Entity for Widget {}
    }

    #[test]
    fn test_entity_type_identity() {
        let a = EntityType::of::<Widget>();
        let b = EntityType::of::<Widget>();
        let c = EntityType::of::<other::Widget>();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short_name(), c.short_name());
        assert!(a.is::<Widget>());
        assert!(!c.is::<Widget>());
    }

    #[test]
    fn test_entity_type_creates_instance() {
        let instance = EntityType::of::<Widget>().create_instance();
        assert!(instance.downcast_ref::<Widget>().is_some());
    }

    #[test]
    fn test_callback_type_display() {
        assert_eq!(EntityCallbackType::PreRemove.to_string(), "PRE_REMOVE");
        assert_eq!(EntityCallbackType::PostLoad.to_string(), "POST_LOAD");
    }
}
