/// Storage-specific errors
use curator_core::StoreError;
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be mapped back into a domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// SQLite reports an unprovisioned table as "no such table: <name>"
    fn missing_relation(&self) -> Option<String> {
        let Self::Database(sqlx::Error::Database(db_err)) = self else {
            return None;
        };
        db_err
            .message()
            .strip_prefix("no such table: ")
            .map(|table| table.to_string())
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        if let Some(table) = err.missing_relation() {
            return StoreError::RelationMissing(table);
        }
        match err {
            StorageError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            other => StoreError::fatal(other.to_string()),
        }
    }
}
