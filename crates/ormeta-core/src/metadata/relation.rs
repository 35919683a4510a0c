//! Relation descriptors between entities.

use super::types::EntityType;
use serde::Serialize;

/// "This entity's `property_name` holds many rows of `related_table_name`,
/// linked back through the related entity's `mapped_by_property_name`."
///
/// The target is named by table rather than by type: the related type may not
/// be registered yet when this side is declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRelationOneToMany {
    /// Collection property on the owning entity.
    pub property_name: String,
    /// Property on the related entity pointing back at this one.
    pub mapped_by_property_name: String,
    /// Table of the related entity.
    pub related_table_name: String,
}

impl EntityRelationOneToMany {
    /// Create a one-to-many relation.
    pub fn new(
        property_name: impl Into<String>,
        related_table_name: impl Into<String>,
        mapped_by_property_name: impl Into<String>,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            mapped_by_property_name: mapped_by_property_name.into(),
            related_table_name: related_table_name.into(),
        }
    }
}

/// The owning ("many") side of a relation.
///
/// The join column and its nullability live on the property's
/// [`EntityField`](super::EntityField), which carries
/// [`EntityFieldType::JoinedEntity`](super::EntityFieldType::JoinedEntity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRelationManyToOne {
    /// Reference property on the owning entity.
    pub property_name: String,
    /// Referenced entity type.
    pub related: EntityType,
}

impl EntityRelationManyToOne {
    /// Create a many-to-one relation.
    pub fn new(property_name: impl Into<String>, related: EntityType) -> Self {
        Self {
            property_name: property_name.into(),
            related,
        }
    }
}
