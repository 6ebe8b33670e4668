//! Database-specific error types and conversions.

use identra_core::error::IdentraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Corrupt row: {0}")]
    Decode(String),
}

impl From<DbError> for IdentraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => IdentraError::NotFound { entity, id },
            other => IdentraError::Database(other.to_string()),
        }
    }
}
