//! ORMETA Core - entity metadata registration and resolution.
//!
//! Entity types declare their table, columns, primary key, relations and
//! lifecycle callbacks through [`Entity::declare`]. The [`MetadataRegistry`]
//! accumulates those declarations per type, merges them along declared
//! inheritance chains, and serves one frozen [`EntityMetadata`] per type.
//! Relations between entities, including circular ones, are resolved lazily
//! when first read. Types listed with [`define_entities!`] are registered at
//! load time, so a relation can name a table whose type nothing has read yet.

pub mod config;
pub mod declare;
pub mod entity;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod resolver;

pub use config::{PostServePolicy, RegistryConfig};
pub use declare::EntityDeclaration;
pub use entity::Entity;
pub use error::{Error, Result};
pub use metadata::{
    EntityCallback, EntityCallbackType, EntityFactory, EntityField, EntityFieldType,
    EntityMetadata, EntityRelationManyToOne, EntityRelationOneToMany, EntityType,
};
pub use registry::{BuilderState, EntityBuilder, MetadataRegistry, SharedBuilder};
pub use resolver::{Resolved, ResolvedRelations};

/// Dependencies reached by the exported macros, so callers need not name them.
#[doc(hidden)]
pub mod __reexports {
    pub use ctor;
}
