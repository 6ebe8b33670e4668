//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in the
//! database crate; the policy layer in `identra-auth` is generic over
//! these traits.

use uuid::Uuid;

use crate::error::IdentraResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditLogEntry},
    country::Country,
    password_history::{PasswordHistoryEntry, RecordPasswordHistory},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    /// Create a user without a credential (`password_hash` starts
    /// empty; the set-password flow attaches one later).
    fn create(&self, input: CreateUser) -> impl Future<Output = IdentraResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = IdentraResult<User>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = IdentraResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = IdentraResult<User>> + Send;
    /// Replace the stored password hash. The caller is responsible for
    /// hashing; plaintext never reaches the store.
    fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> impl Future<Output = IdentraResult<User>> + Send;
    /// Hard delete. History cleanup is cascaded by the caller.
    fn delete(&self, id: Uuid) -> impl Future<Output = IdentraResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = IdentraResult<PaginatedResult<User>>> + Send;
}

pub trait PasswordHistoryRepository: Send + Sync {
    fn insert(
        &self,
        input: RecordPasswordHistory,
    ) -> impl Future<Output = IdentraResult<PasswordHistoryEntry>> + Send;
    /// All history rows for a user, newest first (`created_at` desc,
    /// record id desc as tiebreak — a total order).
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = IdentraResult<Vec<PasswordHistoryEntry>>> + Send;
    /// Delete the given rows for a user. Returns the number removed.
    fn delete_entries(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> impl Future<Output = IdentraResult<u64>> + Send;
    /// Delete every row for a user. Returns the number removed.
    fn delete_for_user(&self, user_id: Uuid) -> impl Future<Output = IdentraResult<u64>> + Send;
}

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub target_id: Option<Uuid>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = IdentraResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = IdentraResult<PaginatedResult<AuditLogEntry>>> + Send;
}

/// Read-only reference data, seeded by migration.
pub trait CountryRepository: Send + Sync {
    fn list(&self) -> impl Future<Output = IdentraResult<Vec<Country>>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = IdentraResult<Country>> + Send;
}
