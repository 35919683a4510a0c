//! Metadata registry.
//!
//! Accumulates per-type declarations and serves merged, frozen
//! [`EntityMetadata`](crate::metadata::EntityMetadata) snapshots.

mod builder;
mod definitions;
mod registry;

pub use builder::{BuilderState, EntityBuilder};
pub use definitions::{define, defined_types};
pub use registry::{MetadataRegistry, SharedBuilder};
