//! Load-phase list of defined entity types.
//!
//! [`define_entities!`](crate::define_entities) adds types here from a
//! constructor that runs when the binary is loaded, before `main`. Registries
//! read the list when they look a type up by table, so every defined type is
//! visible to relation resolution without being touched first.

use crate::entity::Entity;
use crate::metadata::EntityType;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::trace;

static DEFINED: Lazy<Mutex<Vec<EntityType>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Add `T` to the defined types. Defining a type twice is a no-op.
pub fn define<T: Entity>() {
    let entity_type = EntityType::of::<T>();
    let mut defined = DEFINED.lock();
    if !defined.contains(&entity_type) {
        trace!(entity = %entity_type, "defining entity type");
        defined.push(entity_type);
    }
}

/// Every defined type, in definition order.
pub fn defined_types() -> Vec<EntityType> {
    DEFINED.lock().clone()
}

/// Define entity types at load time.
///
/// Expands to a constructor that calls [`define`] for each listed type when
/// the binary is loaded, so registries find them by table before anything
/// has read their metadata.
///
/// ```
/// use ormeta_core::{define_entities, Entity, EntityDeclaration, Result};
///
/// #[derive(Default)]
/// struct Invoice;
///
/// impl Entity for Invoice {
///     fn declare(decl: EntityDeclaration<'_, Self>) -> Result<EntityDeclaration<'_, Self>> {
///         decl.table("invoices")?.column("invoiceId", "invoice_id")?.id("invoiceId")
///     }
/// }
///
/// define_entities!(Invoice);
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! define_entities {
    ($($entity:ty),+ $(,)?) => {
        #[cfg(not(target_arch = "wasm32"))]
        #[$crate::__reexports::ctor::ctor(unsafe, anonymous, crate_path = $crate::__reexports::ctor)]
        fn __define_entities() {
            $( $crate::registry::define::<$entity>(); )+
        }
    };
}
