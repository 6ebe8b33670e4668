//! Password history domain model.
//!
//! One row per superseded (or initially set) password hash. Rows are
//! written only by the password-history service and pruned to a fixed
//! retention window per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a new history row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPasswordHistory {
    pub user_id: Uuid,
    pub password_hash: String,
}
