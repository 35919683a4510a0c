//! Entity metadata descriptors.
//!
//! Value objects describing mapped tables, columns, relations and lifecycle
//! callbacks. They carry no behavior beyond lookups.

mod entity;
mod field;
mod relation;
mod types;

pub use entity::{EntityFactory, EntityMetadata};
pub use field::{EntityCallback, EntityField};
pub use relation::{EntityRelationManyToOne, EntityRelationOneToMany};
pub use types::{EntityCallbackType, EntityFieldType, EntityType};
