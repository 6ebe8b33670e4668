//! Auth error types.

use identra_core::error::IdentraError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("insufficient permissions for target user")]
    Forbidden,

    #[error("account is inactive")]
    AccountInactive,

    #[error("password and confirmation do not match")]
    PasswordMismatch,

    #[error("a password has already been set for this account")]
    PasswordAlreadySet,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("cannot reuse a recent password")]
    PasswordReuse,

    #[error("account is already active")]
    AlreadyActive,

    #[error("account is already inactive")]
    AlreadyInactive,

    #[error("role is already assigned to this user")]
    RoleAlreadyAssigned,

    #[error("role is not assigned to this user")]
    RoleNotAssigned,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for IdentraError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::AccountInactive => {
                IdentraError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Forbidden => IdentraError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::PasswordMismatch
            | AuthError::PasswordAlreadySet
            | AuthError::PasswordTooShort { .. }
            | AuthError::PasswordReuse
            | AuthError::AlreadyActive
            | AuthError::AlreadyInactive
            | AuthError::RoleAlreadyAssigned
            | AuthError::RoleNotAssigned => IdentraError::Validation {
                message: err.to_string(),
            },
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                IdentraError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => IdentraError::Crypto(msg),
        }
    }
}
