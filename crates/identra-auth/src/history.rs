//! Password history — durable record of past password hashes per user,
//! and reuse detection.

use uuid::Uuid;

use identra_core::error::{IdentraError, IdentraResult};
use identra_core::models::password_history::{PasswordHistoryEntry, RecordPasswordHistory};
use identra_core::repository::PasswordHistoryRepository;

use crate::cleanup::PasswordHistoryCleanup;
use crate::password;

/// Records superseded password hashes and answers "has this password
/// been used before by this user."
pub struct PasswordHistoryService<H: PasswordHistoryRepository> {
    history_repo: H,
    cleanup: PasswordHistoryCleanup<H>,
    pepper: Option<String>,
}

impl<H: PasswordHistoryRepository + Clone> PasswordHistoryService<H> {
    pub fn new(history_repo: H, pepper: Option<String>, retention: usize) -> Self {
        Self {
            cleanup: PasswordHistoryCleanup::new(history_repo.clone(), retention),
            history_repo,
            pepper,
        }
    }
}

impl<H: PasswordHistoryRepository> PasswordHistoryService<H> {
    /// Record a newly set password hash and trim the user's history
    /// back to the retention window. The just-inserted row counts
    /// toward the window.
    pub async fn record(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> IdentraResult<PasswordHistoryEntry> {
        if password_hash.trim().is_empty() {
            return Err(IdentraError::validation("password hash must not be empty"));
        }

        let entry = self
            .history_repo
            .insert(RecordPasswordHistory {
                user_id,
                password_hash: password_hash.to_string(),
            })
            .await?;

        self.cleanup.remove_old_passwords(user_id).await?;

        Ok(entry)
    }

    /// Whether `password` verifies against any stored hash for the
    /// user. `false` on empty history. Read-only.
    pub async fn was_used_before(&self, user_id: Uuid, password: &str) -> IdentraResult<bool> {
        if password.trim().is_empty() {
            return Err(IdentraError::validation("password must not be empty"));
        }

        let entries = self.history_repo.list_for_user(user_id).await?;
        for entry in &entries {
            if password::verify_password(password, &entry.password_hash, self.pepper.as_deref())? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
