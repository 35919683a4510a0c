//! Shared entity fixtures for the integration tests.

#![allow(dead_code)]

use ormeta_core::{define_entities, Entity, EntityDeclaration, Result};

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FooEntity {
    pub foo_id: Option<String>,
    pub foo_name: Option<String>,
    pub foo_number: Option<i64>,
    pub foo_boolean: Option<bool>,
}

impl FooEntity {
    pub fn on_pre_remove(&self) {}
}

impl Entity for FooEntity {
    fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
        decl.table("foos")?
            .id("fooId")?
            .column("fooId", "foo_id")?
            .column("fooName", "foo_name")?
            .column("fooNumber", "foo_number")?
            .column("fooBoolean", "foo_boolean")?
            .pre_remove("onPreRemove")
    }
}

#[derive(Debug, Default)]
pub struct CartEntity {
    pub cart_id: Option<String>,
    pub cart_items: Vec<CartItemEntity>,
}

impl Entity for CartEntity {
    fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
        decl.table("carts")?
            .id("cartId")?
            .column("cartId", "cart_id")?
            .one_to_many("cartItems", "cart_items", "cart")
    }
}

#[derive(Debug, Default)]
pub struct CartItemEntity {
    pub cart_item_id: Option<String>,
    pub cart: Option<Box<CartEntity>>,
}

impl Entity for CartItemEntity {
    fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
        decl.table("cart_items")?
            .id("cartItemId")?
            .column("cartItemId", "cart_item_id")?
            .many_to_one::<CartEntity>("cart")?
            .join_column("cart", "cart_id", false)
    }
}

define_entities!(CartEntity, CartItemEntity);
