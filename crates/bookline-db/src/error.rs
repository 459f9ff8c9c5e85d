//! Database-specific error types and conversions.

use bookline_core::error::BooklineError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// The transactional slot check rejected a write — a concurrent
    /// writer holds an overlapping interval.
    #[error("Slot conflict: {message}")]
    Conflict { message: String },

    #[error("Cryptography error: {0}")]
    Crypto(String),
}

impl From<DbError> for BooklineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => BooklineError::NotFound { entity, id },
            DbError::Conflict { message } => BooklineError::Conflict { message },
            DbError::Crypto(msg) => BooklineError::Crypto(msg),
            other => BooklineError::Database(other.to_string()),
        }
    }
}
