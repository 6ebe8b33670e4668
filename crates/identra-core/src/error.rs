//! Error types for the IDENTRA system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentraError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentraError {
    /// Argument-contract violation, raised before any store access.
    pub fn validation(message: impl Into<String>) -> Self {
        IdentraError::Validation {
            message: message.into(),
        }
    }
}

pub type IdentraResult<T> = Result<T, IdentraError>;
