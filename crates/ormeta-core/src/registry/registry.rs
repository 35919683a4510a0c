//! Metadata registry: entity type identity to declaration builder.

use super::builder::{merge_chain, BuilderState, EntityBuilder};
use super::definitions::defined_types;
use crate::config::{PostServePolicy, RegistryConfig};
use crate::declare::EntityDeclaration;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::metadata::{EntityMetadata, EntityType};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Shared handle to one type's builder.
pub type SharedBuilder = Arc<Mutex<EntityBuilder>>;

static GLOBAL: Lazy<MetadataRegistry> = Lazy::new(MetadataRegistry::new);

/// Process-wide store of entity declarations and served metadata.
///
/// Entries are keyed by [`EntityType`] (a [`TypeId`](std::any::TypeId)).
/// Most code uses [`MetadataRegistry::global`]; tests construct their own
/// instance to keep registrations isolated.
pub struct MetadataRegistry {
    config: RegistryConfig,
    builders: DashMap<EntityType, SharedBuilder>,
    served: DashMap<EntityType, Arc<EntityMetadata>>,
    /// Serializes registration and serving. Reentrant so a type's
    /// declarations can register its parent on the same thread.
    registration: ReentrantMutex<()>,
}

impl MetadataRegistry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            builders: DashMap::new(),
            served: DashMap::new(),
            registration: ReentrantMutex::new(()),
        }
    }

    /// The process-wide registry used by [`Entity::get_metadata`].
    pub fn global() -> &'static MetadataRegistry {
        &GLOBAL
    }

    /// Registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the builder for a type, creating it on first use.
    ///
    /// Always returns the same builder for the same type.
    pub fn get_or_create(&self, entity_type: EntityType) -> SharedBuilder {
        self.builders
            .entry(entity_type)
            .or_insert_with(|| {
                trace!(entity = %entity_type, "creating metadata builder");
                Arc::new(Mutex::new(EntityBuilder::new(entity_type)))
            })
            .value()
            .clone()
    }

    fn get(&self, entity_type: EntityType) -> Option<SharedBuilder> {
        self.builders.get(&entity_type).map(|b| b.value().clone())
    }

    /// Open a declaration block for `T`.
    pub fn declare<T: Entity>(&self) -> EntityDeclaration<'_, T> {
        EntityDeclaration::new(self)
    }

    /// Run `T`'s own declarations once.
    ///
    /// Later calls are no-ops. A failed registration can be retried.
    pub fn register<T: Entity>(&self) -> Result<()> {
        let entity_type = EntityType::of::<T>();
        let _guard = self.registration.lock();

        let builder = self.get_or_create(entity_type);
        {
            let mut builder = builder.lock();
            if builder.is_registered() {
                return Ok(());
            }
            builder.set_registered(true);
        }

        debug!(entity = %entity_type, "registering entity declarations");
        if let Err(err) = T::declare(self.declare::<T>()) {
            builder.lock().set_registered(false);
            return Err(err);
        }
        Ok(())
    }

    /// Apply one declaration to a type's builder.
    ///
    /// Once served, a declaration that would change the builder is rejected
    /// or dropped according to [`PostServePolicy`]; one that changes nothing
    /// is accepted.
    ///
    /// Holds the registration lock so a declaration lands either wholly
    /// before a concurrent serve or after it.
    pub(crate) fn apply<F>(&self, entity_type: EntityType, declaration: F) -> Result<()>
    where
        F: FnOnce(&mut EntityBuilder) -> Result<()>,
    {
        let _guard = self.registration.lock();
        let builder = self.get_or_create(entity_type);
        let mut builder = builder.lock();

        if builder.state() != BuilderState::Served {
            declaration(&mut *builder)?;
            builder.mark_building();
            return Ok(());
        }

        let mut candidate = builder.clone();
        declaration(&mut candidate)?;
        if candidate.declarations == builder.declarations {
            return Ok(());
        }

        match self.config.post_serve_policy {
            PostServePolicy::Reject => Err(Error::PostServeMutation {
                entity: entity_type.short_name().to_string(),
            }),
            PostServePolicy::Ignore => {
                warn!(entity = %entity_type, "ignoring declaration after metadata was served");
                Ok(())
            }
        }
    }

    /// Served metadata for `T`, registering it first if needed.
    pub fn metadata<T: Entity>(&self) -> Result<Arc<EntityMetadata>> {
        self.metadata_of(EntityType::of::<T>())
    }

    /// Served metadata for a type, registering it first if needed.
    ///
    /// The first call merges the type's ancestor chain, freezes every builder
    /// in it and caches the result; later calls return the same `Arc`.
    pub fn metadata_of(&self, entity_type: EntityType) -> Result<Arc<EntityMetadata>> {
        if let Some(metadata) = self.served.get(&entity_type) {
            return Ok(metadata.value().clone());
        }

        let _guard = self.registration.lock();
        entity_type.register_in(self)?;
        if let Some(metadata) = self.served.get(&entity_type) {
            return Ok(metadata.value().clone());
        }

        let chain = self.ancestor_chain(entity_type)?;
        let snapshot: Vec<EntityBuilder> = chain.iter().map(|b| b.lock().clone()).collect();
        let metadata = Arc::new(merge_chain(&snapshot)?);

        for builder in &chain {
            builder.lock().mark_served();
        }
        self.served.insert(entity_type, metadata.clone());

        debug!(
            entity = %entity_type,
            table = %metadata.table_name,
            fields = metadata.fields.len(),
            "serving entity metadata"
        );
        Ok(metadata)
    }

    /// Builders from the most distant ancestor down to `entity_type`.
    fn ancestor_chain(&self, entity_type: EntityType) -> Result<Vec<SharedBuilder>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(entity_type);

        while let Some(ty) = current {
            if !seen.insert(ty) {
                return Err(Error::InheritanceCycle {
                    entity: ty.short_name().to_string(),
                });
            }
            ty.register_in(self)?;
            let builder = self.get_or_create(ty);
            current = builder.lock().parent();
            chain.push(builder);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Register every type listed with [`define_entities!`](crate::define_entities).
    ///
    /// Types already registered are skipped. Table lookups call this first,
    /// so a one-to-many target that nothing has touched yet is still found.
    pub fn register_defined(&self) -> Result<()> {
        for entity_type in defined_types() {
            entity_type.register_in(self)?;
        }
        Ok(())
    }

    /// Find the type whose own table binding is `table_name`.
    ///
    /// Defined types are registered before the lookup.
    pub fn find_by_table(&self, table_name: &str) -> Result<Option<EntityType>> {
        self.register_defined()?;

        let mut found: Option<EntityType> = None;
        for builder in self.builders_snapshot() {
            let builder = builder.lock();
            if builder.own_table_name() != Some(table_name) {
                continue;
            }
            if let Some(first) = found {
                let mut names = [first.short_name(), builder.entity_type().short_name()];
                names.sort_unstable();
                return Err(Error::AmbiguousTable {
                    table: table_name.to_string(),
                    first: names[0].to_string(),
                    second: names[1].to_string(),
                });
            }
            found = Some(builder.entity_type());
        }
        Ok(found)
    }

    /// Clone out every builder so no map lock is held while builders are locked.
    fn builders_snapshot(&self) -> Vec<SharedBuilder> {
        self.builders.iter().map(|e| e.value().clone()).collect()
    }

    /// Check if `T` has a registry entry.
    pub fn contains<T: Entity>(&self) -> bool {
        self.builders.contains_key(&EntityType::of::<T>())
    }

    /// Lifecycle state of a type's entry.
    pub fn state_of(&self, entity_type: EntityType) -> BuilderState {
        self.get(entity_type)
            .map(|b| b.lock().state())
            .unwrap_or(BuilderState::Uninitialized)
    }

    /// All types with a registry entry, sorted by type name.
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut types: Vec<_> = self.builders.iter().map(|e| *e.key()).collect();
        types.sort_by_key(|t| t.name());
        types
    }

    /// Types that map a table of their own or inherit one, sorted by type name.
    ///
    /// Leaves out ancestors without a table binding: those are abstract bases
    /// that only exist to be extended.
    pub fn mapped_types(&self) -> Vec<EntityType> {
        let snapshot: Vec<EntityBuilder> = self
            .builders_snapshot()
            .iter()
            .map(|b| b.lock().clone())
            .collect();
        let parents: HashSet<EntityType> = snapshot.iter().filter_map(|b| b.parent()).collect();

        let mut types: Vec<EntityType> = snapshot
            .iter()
            .filter(|b| b.own_table_name().is_some() || !parents.contains(&b.entity_type()))
            .map(|b| b.entity_type())
            .collect();
        types.sort_by_key(|t| t.name());
        types
    }

    /// All table names bound so far, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .builders_snapshot()
            .iter()
            .filter_map(|b| b.lock().own_table_name().map(String::from))
            .collect();
        names.sort();
        names
    }

    /// Number of registry entries.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Check if the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Drop every entry and served snapshot.
    ///
    /// Snapshots already handed out stay valid; they are just no longer cached.
    pub fn clear(&self) {
        let _guard = self.registration.lock();
        self.served.clear();
        self.builders.clear();
        debug!("metadata registry cleared");
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityField;

    #[derive(Default)]
    struct Foo;

    impl Entity for Foo {
        fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
            decl.table("foos")?
                .column("fooId", "foo_id")?
                .id("fooId")?
                .column("fooName", "foo_name")
        }
    }

    #[derive(Default)]
    struct Bar;

    impl Entity for Bar {}

    #[test]
    fn test_get_or_create_returns_same_builder() {
        let registry = MetadataRegistry::new();
        let a = registry.get_or_create(EntityType::of::<Bar>());
        let b = registry.get_or_create(EntityType::of::<Bar>());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.state_of(EntityType::of::<Bar>()), BuilderState::Uninitialized);
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = MetadataRegistry::new();
        registry.register::<Foo>().unwrap();
        registry.register::<Foo>().unwrap();

        let metadata = registry.metadata::<Foo>().unwrap();
        assert_eq!(metadata.fields.len(), 2);
    }

    #[test]
    fn test_metadata_registers_lazily_and_caches() {
        let registry = MetadataRegistry::new();
        assert!(!registry.contains::<Foo>());

        let first = registry.metadata::<Foo>().unwrap();
        let second = registry.metadata::<Foo>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.get_field("fooName"), Some(&EntityField::new("fooName", "foo_name")));
        assert_eq!(registry.state_of(EntityType::of::<Foo>()), BuilderState::Served);
    }

    #[test]
    fn test_post_serve_mutation_rejected() {
        let registry = MetadataRegistry::new();
        let served = registry.metadata::<Foo>().unwrap();

        let err = registry
            .declare::<Foo>()
            .column("fooNumber", "foo_number")
            .err()
            .unwrap();
        assert!(matches!(err, Error::PostServeMutation { .. }));

        registry.declare::<Foo>().column("fooName", "foo_name").unwrap();
        assert!(Arc::ptr_eq(&served, &registry.metadata::<Foo>().unwrap()));
    }

    #[test]
    fn test_post_serve_mutation_ignored() {
        let registry = MetadataRegistry::with_config(
            RegistryConfig::new().with_post_serve_policy(PostServePolicy::Ignore),
        );
        let served = registry.metadata::<Foo>().unwrap();

        registry
            .declare::<Foo>()
            .column("fooNumber", "foo_number")
            .unwrap();

        let again = registry.metadata::<Foo>().unwrap();
        assert!(Arc::ptr_eq(&served, &again));
        assert!(again.get_field("fooNumber").is_none());
    }

    #[test]
    fn test_find_by_table() {
        let registry = MetadataRegistry::new();
        registry.register::<Foo>().unwrap();

        assert_eq!(registry.find_by_table("foos").unwrap(), Some(EntityType::of::<Foo>()));
        assert_eq!(registry.find_by_table("bars").unwrap(), None);
        assert_eq!(registry.table_names(), vec!["foos".to_string()]);
    }

    #[test]
    fn test_ambiguous_table() {
        let registry = MetadataRegistry::new();
        registry.register::<Foo>().unwrap();
        registry.declare::<Bar>().table("foos").unwrap();

        let err = registry.find_by_table("foos").unwrap_err();
        assert!(matches!(err, Error::AmbiguousTable { .. }));
    }

    #[test]
    fn test_clear() {
        let registry = MetadataRegistry::new();
        let served = registry.metadata::<Foo>().unwrap();
        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(served.table_name, "foos");

        let fresh = registry.metadata::<Foo>().unwrap();
        assert!(!Arc::ptr_eq(&served, &fresh));
        assert_eq!(*served, *fresh);
    }
}
