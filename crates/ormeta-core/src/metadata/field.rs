//! Field and callback descriptors.

use super::types::{EntityCallbackType, EntityFieldType};
use serde::Serialize;

/// One property-to-column binding of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityField {
    /// Property name on the entity type.
    pub property_name: String,
    /// Column name in the entity's table.
    pub column_name: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// How the column maps onto the property.
    pub field_type: EntityFieldType,
}

impl EntityField {
    /// Create a new nullable, regular field.
    pub fn new(property_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            column_name: column_name.into(),
            nullable: true,
            field_type: EntityFieldType::Regular,
        }
    }

    /// Create a joined-entity field backed by a foreign-key column.
    pub fn joined(
        property_name: impl Into<String>,
        column_name: impl Into<String>,
        nullable: bool,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            column_name: column_name.into(),
            nullable,
            field_type: EntityFieldType::JoinedEntity,
        }
    }

    /// Set nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Check if this field references another entity.
    pub fn is_joined(&self) -> bool {
        self.field_type == EntityFieldType::JoinedEntity
    }
}

/// A lifecycle callback bound to a method of the entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityCallback {
    /// Method name invoked by the execution layer.
    pub property_name: String,
    /// Lifecycle point.
    pub callback_type: EntityCallbackType,
}

impl EntityCallback {
    /// Create a new callback descriptor.
    pub fn new(property_name: impl Into<String>, callback_type: EntityCallbackType) -> Self {
        Self {
            property_name: property_name.into(),
            callback_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_defaults() {
        let field = EntityField::new("fooName", "foo_name");

        assert_eq!(field.property_name, "fooName");
        assert_eq!(field.column_name, "foo_name");
        assert!(field.nullable);
        assert!(!field.is_joined());
    }

    #[test]
    fn test_joined_field() {
        let field = EntityField::joined("cart", "cart_id", false);

        assert!(field.is_joined());
        assert!(!field.nullable);
        assert_ne!(field, EntityField::new("cart", "cart_id").with_nullable(false));
    }
}
