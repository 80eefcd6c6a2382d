/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Schema bootstrap error
    #[error("Migration error: {0}")]
    Migration(String),

    /// A referenced row does not exist (foreign key violation). Holds one
    /// client-facing message per missing reference.
    #[error("{}", .0.join(", "))]
    InvalidReference(Vec<String>),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Database error from `SQLx` (malformed statement, constraint violation, ...)
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether `SQLite` rejected a statement for a dangling foreign key
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            Self::Database(sqlx::Error::Database(e)) if e.is_foreign_key_violation()
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
