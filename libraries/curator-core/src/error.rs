/// Storage error types shared across the storage boundary
use thiserror::Error;

/// Result type alias using `StoreError`
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Tagged storage failure.
///
/// Callers branch on the tag instead of inspecting driver error codes.
/// Only `RelationMissing` has a recognized degrade path (the approved
/// playlist allow-list); everything else is fatal to the calling operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "user"
        entity: String,
        /// Identifier that was looked up
        id: String,
    },

    /// The backing relation (table) has not been provisioned
    #[error("Relation missing: {0}")]
    RelationMissing(String),

    /// Any other storage failure
    #[error("Storage failure: {0}")]
    Fatal(String),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a fatal error
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Whether the failure means the relation itself is absent
    pub fn is_relation_missing(&self) -> bool {
        matches!(self, Self::RelationMissing(_))
    }
}
