//! IDENTRA Core — domain models, repository traits, and shared error
//! types for the identity-management service.

pub mod error;
pub mod models;
pub mod principal;
pub mod repository;

pub use error::{IdentraError, IdentraResult};
pub use principal::{PermissionDecision, Principal};
