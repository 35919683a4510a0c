//! Declarations: the authoring API for entity metadata.
//!
//! Each method records one fact about `T` in the registry and hands the
//! declaration back, so an entity's mapping reads as a single chain:
//!
//! ```
//! use ormeta_core::{Entity, EntityDeclaration, Result};
//!
//! #[derive(Default)]
//! struct Cart;
//!
//! #[derive(Default)]
//! struct CartItem;
//!
//! impl Entity for Cart {
//!     fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
//!         decl.table("carts")?
//!             .column("cartId", "cart_id")?
//!             .id("cartId")?
//!             .one_to_many("cartItems", "cart_items", "cart")
//!     }
//! }
//!
//! impl Entity for CartItem {
//!     fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
//!         decl.table("cart_items")?
//!             .column("cartItemId", "cart_item_id")?
//!             .id("cartItemId")?
//!             .many_to_one::<Cart>("cart")?
//!             .join_column("cart", "cart_id", false)
//!     }
//! }
//! ```
//!
//! Declarations are idempotent and commute: applying the same one twice, or
//! a set of them in any order, yields the same metadata.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::metadata::{EntityCallback, EntityCallbackType, EntityRelationOneToMany, EntityType};
use crate::registry::{EntityBuilder, MetadataRegistry};
use std::marker::PhantomData;
use tracing::trace;

/// Declaration block for the entity type `T`.
pub struct EntityDeclaration<'r, T: Entity> {
    registry: &'r MetadataRegistry,
    entity_type: EntityType,
    _entity: PhantomData<fn() -> T>,
}

impl<'r, T: Entity> EntityDeclaration<'r, T> {
    pub(crate) fn new(registry: &'r MetadataRegistry) -> Self {
        Self {
            registry,
            entity_type: EntityType::of::<T>(),
            _entity: PhantomData,
        }
    }

    /// Registry the declarations are recorded in.
    pub fn registry(&self) -> &'r MetadataRegistry {
        self.registry
    }

    /// Type being declared.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn apply<F>(self, concern: &'static str, declaration: F) -> Result<Self>
    where
        F: FnOnce(&mut EntityBuilder) -> Result<()>,
    {
        trace!(entity = %self.entity_type, concern, "applying declaration");
        self.registry.apply(self.entity_type, declaration)?;
        Ok(self)
    }

    fn require(&self, what: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Error::invalid(
                self.entity_type.short_name(),
                format!("{what} must not be empty"),
            ));
        }
        Ok(())
    }

    /// Declare `P` as the mapped parent of `T`.
    ///
    /// `T` inherits every declaration of `P` (and of `P`'s ancestors); its own
    /// declarations take precedence. `P` is registered if it was not already.
    pub fn extends<P: Entity>(self) -> Result<Self> {
        let parent = EntityType::of::<P>();
        self.registry.register::<P>()?;
        self.apply("extends", |b| b.set_parent(parent))
    }

    /// Bind `T` to a table.
    pub fn table(self, table_name: &str) -> Result<Self> {
        self.require("table name", table_name)?;
        self.apply("table", |b| b.set_table(table_name))
    }

    /// Bind a property to a nullable column.
    pub fn column(self, property_name: &str, column_name: &str) -> Result<Self> {
        self.bind_column(property_name, column_name, None)
    }

    /// Bind a property to a column with explicit nullability.
    pub fn nullable_column(
        self,
        property_name: &str,
        column_name: &str,
        nullable: bool,
    ) -> Result<Self> {
        self.bind_column(property_name, column_name, Some(nullable))
    }

    fn bind_column(
        self,
        property_name: &str,
        column_name: &str,
        nullable: Option<bool>,
    ) -> Result<Self> {
        self.require("property name", property_name)?;
        self.require("column name", column_name)?;
        self.apply("column", |b| {
            b.bind_column(property_name, column_name, nullable);
            Ok(())
        })
    }

    /// Mark a property as the primary key.
    pub fn id(self, property_name: &str) -> Result<Self> {
        self.require("id property name", property_name)?;
        self.apply("id", |b| b.mark_id(property_name))
    }

    /// Declare that `property_name` holds many rows of `related_table_name`,
    /// linked back through the related entity's `mapped_by` property.
    pub fn one_to_many(
        self,
        property_name: &str,
        related_table_name: &str,
        mapped_by: &str,
    ) -> Result<Self> {
        self.require("property name", property_name)?;
        self.require("related table name", related_table_name)?;
        self.require("mapped-by property name", mapped_by)?;
        let relation = EntityRelationOneToMany::new(property_name, related_table_name, mapped_by);
        self.apply("one_to_many", |b| {
            b.add_one_to_many(relation);
            Ok(())
        })
    }

    /// Declare that `property_name` references one `R`.
    ///
    /// Pair with [`join_column`](Self::join_column) to name the foreign key.
    pub fn many_to_one<R: Entity>(self, property_name: &str) -> Result<Self> {
        self.require("property name", property_name)?;
        let related = EntityType::of::<R>();
        self.apply("many_to_one", |b| {
            b.set_many_to_one(property_name, related);
            Ok(())
        })
    }

    /// Name the foreign-key column backing a property.
    pub fn join_column(self, property_name: &str, column_name: &str, nullable: bool) -> Result<Self> {
        self.require("property name", property_name)?;
        self.require("join column name", column_name)?;
        self.apply("join_column", |b| {
            b.set_join_column(property_name, column_name, nullable);
            Ok(())
        })
    }

    /// Register a method as a lifecycle callback.
    pub fn callback(self, method_name: &str, callback_type: EntityCallbackType) -> Result<Self> {
        self.require("callback method name", method_name)?;
        let callback = EntityCallback::new(method_name, callback_type);
        self.apply("callback", |b| {
            b.add_callback(callback);
            Ok(())
        })
    }

    /// Register a [`PrePersist`](EntityCallbackType::PrePersist) callback.
    pub fn pre_persist(self, method_name: &str) -> Result<Self> {
        self.callback(method_name, EntityCallbackType::PrePersist)
    }

    /// Register a [`PostPersist`](EntityCallbackType::PostPersist) callback.
    pub fn post_persist(self, method_name: &str) -> Result<Self> {
        self.callback(method_name, EntityCallbackType::PostPersist)
    }

    /// Register a [`PreUpdate`](EntityCallbackType::PreUpdate) callback.
    pub fn pre_update(self, method_name: &str) -> Result<Self> {
        self.callback(method_name, EntityCallbackType::PreUpdate)
    }

    /// Register a [`PostUpdate`](EntityCallbackType::PostUpdate) callback.
    pub fn post_update(self, method_name: &str) -> Result<Self> {
        self.callback(method_name, EntityCallbackType::PostUpdate)
    }

    /// Register a [`PreRemove`](EntityCallbackType::PreRemove) callback.
    pub fn pre_remove(self, method_name: &str) -> Result<Self> {
        self.callback(method_name, EntityCallbackType::PreRemove)
    }

    /// Register a [`PostRemove`](EntityCallbackType::PostRemove) callback.
    pub fn post_remove(self, method_name: &str) -> Result<Self> {
        self.callback(method_name, EntityCallbackType::PostRemove)
    }

    /// Register a [`PostLoad`](EntityCallbackType::PostLoad) callback.
    pub fn post_load(self, method_name: &str) -> Result<Self> {
        self.callback(method_name, EntityCallbackType::PostLoad)
    }
}
