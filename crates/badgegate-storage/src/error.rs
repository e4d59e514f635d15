use thiserror::Error;

/// Storage-specific error types for the credential store and audit log.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Input rejected before reaching the database
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored row could not be turned back into a domain value
    #[error("Corrupted row in {table}: {message}")]
    Corrupted { table: &'static str, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn corrupted(table: &'static str, message: impl Into<String>) -> Self {
        Self::Corrupted {
            table,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
