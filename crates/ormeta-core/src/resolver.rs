//! Relation resolution.
//!
//! Relations are declared before their targets necessarily exist: one-to-many
//! names its target by table, many-to-one by type. Resolution is deferred to
//! read time, when every entity in a dependency cycle has been declared, and
//! is recomputed on every call; stability comes from the frozen snapshots.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::metadata::{
    EntityMetadata, EntityRelationManyToOne, EntityRelationOneToMany, EntityType,
};
use crate::registry::MetadataRegistry;
use std::sync::Arc;
use tracing::debug;

/// A relation paired with the metadata of its target.
#[derive(Debug, Clone)]
pub struct Resolved<R> {
    /// Relation as declared.
    pub relation: R,
    /// Metadata of the related entity.
    pub target: Arc<EntityMetadata>,
}

/// Every relation of one entity, resolved.
#[derive(Debug, Clone)]
pub struct ResolvedRelations {
    /// Entity owning the relations.
    pub source: Arc<EntityMetadata>,
    /// Resolved one-to-many relations, in declaration order.
    pub one_to_many: Vec<Resolved<EntityRelationOneToMany>>,
    /// Resolved many-to-one relations, in field order.
    pub many_to_one: Vec<Resolved<EntityRelationManyToOne>>,
}

impl ResolvedRelations {
    /// Target of the relation declared on `property_name`, if any.
    pub fn target_of(&self, property_name: &str) -> Option<&Arc<EntityMetadata>> {
        self.one_to_many
            .iter()
            .find(|r| r.relation.property_name == property_name)
            .map(|r| &r.target)
            .or_else(|| {
                self.many_to_one
                    .iter()
                    .find(|r| r.relation.property_name == property_name)
                    .map(|r| &r.target)
            })
    }
}

impl MetadataRegistry {
    /// Resolve a one-to-many relation declared on `source` to its target.
    pub fn resolve_one_to_many(
        &self,
        source: &EntityMetadata,
        relation: &EntityRelationOneToMany,
    ) -> Result<Arc<EntityMetadata>> {
        let unresolved = |table: String| Error::UnresolvedRelation {
            entity: source.entity_type.short_name().to_string(),
            property: relation.property_name.clone(),
            table,
        };

        let target_type = self
            .find_by_table(&relation.related_table_name)?
            .ok_or_else(|| unresolved(relation.related_table_name.clone()))?;
        let target = self.metadata_of(target_type)?;

        if self.config().validate_mapped_by {
            let back_reference = target
                .get_field(&relation.mapped_by_property_name)
                .filter(|field| field.is_joined());
            if back_reference.is_none() {
                return Err(unresolved(format!(
                    "{}.{}",
                    relation.related_table_name, relation.mapped_by_property_name
                )));
            }
        }

        debug!(
            entity = %source.entity_type,
            property = %relation.property_name,
            target = %target.entity_type,
            "resolved one-to-many relation"
        );
        Ok(target)
    }

    /// Resolve a many-to-one relation to its target.
    ///
    /// The target is named by type, so no table lookup is involved; it is
    /// registered on demand.
    pub fn resolve_many_to_one(
        &self,
        relation: &EntityRelationManyToOne,
    ) -> Result<Arc<EntityMetadata>> {
        self.metadata_of(relation.related)
    }

    /// Resolve every relation of `T`.
    pub fn resolve_relations<T: Entity>(&self) -> Result<ResolvedRelations> {
        self.resolve_relations_of(EntityType::of::<T>())
    }

    /// Resolve every relation of a type.
    pub fn resolve_relations_of(&self, entity_type: EntityType) -> Result<ResolvedRelations> {
        let source = self.metadata_of(entity_type)?;

        let mut one_to_many = Vec::with_capacity(source.one_to_many_relations.len());
        for relation in &source.one_to_many_relations {
            let target = self.resolve_one_to_many(&source, relation)?;
            one_to_many.push(Resolved {
                relation: relation.clone(),
                target,
            });
        }

        let mut many_to_one = Vec::with_capacity(source.many_to_one_relations.len());
        for relation in &source.many_to_one_relations {
            let target = self.resolve_many_to_one(relation)?;
            many_to_one.push(Resolved {
                relation: relation.clone(),
                target,
            });
        }

        Ok(ResolvedRelations {
            source,
            one_to_many,
            many_to_one,
        })
    }

    /// Resolve the relations of every mapped type.
    ///
    /// Meant to run once at the end of the load phase: it serves every mapped
    /// entry, including every defined type, and fails on the first relation
    /// that cannot be resolved.
    pub fn resolve_all(&self) -> Result<Vec<ResolvedRelations>> {
        self.register_defined()?;
        self.mapped_types()
            .into_iter()
            .map(|entity_type| self.resolve_relations_of(entity_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::declare::EntityDeclaration;

    #[derive(Default)]
    struct Author;

    impl Entity for Author {
        fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
            decl.table("authors")?
                .column("authorId", "author_id")?
                .id("authorId")?
                .one_to_many("books", "books", "author")
        }
    }

    #[derive(Default)]
    struct Book;

    impl Entity for Book {
        fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
            decl.table("books")?
                .column("bookId", "book_id")?
                .id("bookId")?
                .column("author", "author_id")
        }
    }

    #[test]
    fn test_mapped_by_must_be_joined() {
        let registry = MetadataRegistry::new();
        registry.register::<Book>().unwrap();

        let err = registry.resolve_relations::<Author>().unwrap_err();
        match err {
            Error::UnresolvedRelation { entity, property, table } => {
                assert_eq!(entity, "Author");
                assert_eq!(property, "books");
                assert_eq!(table, "books.author");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_mapped_by_validation_disabled() {
        let registry =
            MetadataRegistry::with_config(RegistryConfig::new().without_mapped_by_validation());
        registry.register::<Book>().unwrap();

        let resolved = registry.resolve_relations::<Author>().unwrap();
        assert_eq!(resolved.one_to_many.len(), 1);
        assert_eq!(resolved.target_of("books").unwrap().table_name, "books");
        assert!(resolved.target_of("missing").is_none());
    }

    #[test]
    fn test_unregistered_target_table() {
        let registry = MetadataRegistry::new();

        let err = registry.resolve_relations::<Author>().unwrap_err();
        assert!(matches!(err, Error::UnresolvedRelation { .. }));
    }
}
