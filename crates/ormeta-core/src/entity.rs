//! The capability every mapped type exposes.

use crate::declare::EntityDeclaration;
use crate::error::Result;
use crate::metadata::{EntityMetadata, EntityType};
use crate::registry::MetadataRegistry;
use std::sync::Arc;

/// A mapped entity type.
///
/// Implementors describe their mapping in [`declare`](Entity::declare); the
/// registry runs it once, the first time the type is registered or its
/// metadata is requested. `Default` backs the metadata's entity factory.
pub trait Entity: Default + Send + Sync + 'static {
    /// Record this type's own declarations.
    ///
    /// The default declares nothing, for types whose mapping is declared
    /// elsewhere through [`MetadataRegistry::declare`].
    fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
        Ok(decl)
    }

    /// Identity of this type in the registry.
    fn entity_type() -> EntityType {
        EntityType::of::<Self>()
    }

    /// Resolved, inheritance-merged metadata from the global registry.
    fn get_metadata(&self) -> Result<Arc<EntityMetadata>> {
        self.metadata_in(MetadataRegistry::global())
    }

    /// Resolved, inheritance-merged metadata from `registry`.
    fn metadata_in(&self, registry: &MetadataRegistry) -> Result<Arc<EntityMetadata>> {
        registry.metadata::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityField;

    #[derive(Default)]
    struct GlobalFoo {
        _foo_name: Option<String>,
    }

    impl Entity for GlobalFoo {
        fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
            decl.table("global_foos")?
                .column("fooId", "foo_id")?
                .id("fooId")
        }
    }

    #[test]
    fn test_get_metadata_uses_global_registry() {
        let entity = GlobalFoo::default();
        let metadata = entity.get_metadata().unwrap();

        assert_eq!(metadata.table_name, "global_foos");
        assert_eq!(metadata.fields, vec![EntityField::new("fooId", "foo_id")]);
        assert!(Arc::ptr_eq(&metadata, &GlobalFoo::default().get_metadata().unwrap()));
        assert!(MetadataRegistry::global().contains::<GlobalFoo>());
    }

    #[test]
    fn test_metadata_in_isolated_registry() {
        let registry = MetadataRegistry::new();
        let metadata = GlobalFoo::default().metadata_in(&registry).unwrap();

        assert_eq!(metadata.id_property_name.as_deref(), Some("fooId"));
        assert_eq!(registry.len(), 1);
        assert_eq!(GlobalFoo::entity_type(), metadata.entity_type);
    }
}
