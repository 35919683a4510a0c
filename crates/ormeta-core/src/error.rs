//! Core error types.

use thiserror::Error;

/// Metadata declaration and resolution errors.
///
/// Entity names are the short type names (or table names for relation
/// targets) so messages stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A declaration carried an empty or conflicting value.
    #[error("invalid declaration on {entity}: {reason}")]
    InvalidDeclaration {
        /// Entity type name.
        entity: String,
        /// What was wrong.
        reason: String,
    },

    /// Identifier marking applied to two different properties.
    #[error("duplicate primary key on {entity}: {existing} is already the id, cannot mark {requested}")]
    DuplicatePrimaryKey {
        /// Entity type name.
        entity: String,
        /// Property already marked as id.
        existing: String,
        /// Property the new marking targeted.
        requested: String,
    },

    /// A relation target could not be found at resolution time.
    #[error("unresolved relation {entity}.{property}: no entity mapped to table {table}")]
    UnresolvedRelation {
        /// Entity type name owning the relation.
        entity: String,
        /// Relation property.
        property: String,
        /// Table (or `table.property` for a missing back-reference) that failed to resolve.
        table: String,
    },

    /// A declaration changed a type whose metadata was already served.
    #[error("metadata for {entity} has already been served and cannot be changed")]
    PostServeMutation {
        /// Entity type name.
        entity: String,
    },

    /// The declared parent chain loops back on itself.
    #[error("inheritance cycle through {entity}")]
    InheritanceCycle {
        /// Entity type name where the cycle was detected.
        entity: String,
    },

    /// Two registered types are bound to the same table.
    #[error("table {table} is mapped by both {first} and {second}")]
    AmbiguousTable {
        /// Table name.
        table: String,
        /// First entity type name.
        first: String,
        /// Second entity type name.
        second: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn invalid(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;
