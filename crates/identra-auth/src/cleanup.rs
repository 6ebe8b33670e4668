//! Password history retention enforcement and erasure.

use uuid::Uuid;

use identra_core::error::IdentraResult;
use identra_core::repository::PasswordHistoryRepository;

/// Trims password history to a fixed retention window and erases it in
/// full when an account is deleted.
pub struct PasswordHistoryCleanup<H: PasswordHistoryRepository> {
    history_repo: H,
    retention: usize,
}

impl<H: PasswordHistoryRepository> PasswordHistoryCleanup<H> {
    pub fn new(history_repo: H, retention: usize) -> Self {
        Self {
            history_repo,
            retention,
        }
    }

    /// Delete every history row beyond the `retention` most recent ones
    /// for the given user. Returns the number of rows removed.
    ///
    /// Fewer rows than the window is a normal no-op, and the operation
    /// is idempotent: a second consecutive call removes nothing.
    pub async fn remove_old_passwords(&self, user_id: Uuid) -> IdentraResult<u64> {
        // Rows arrive newest first; everything past the window is stale.
        let entries = self.history_repo.list_for_user(user_id).await?;
        if entries.len() <= self.retention {
            return Ok(0);
        }

        let stale: Vec<Uuid> = entries[self.retention..].iter().map(|e| e.id).collect();
        self.history_repo.delete_entries(user_id, &stale).await
    }

    /// Delete all history rows for the given user (account-deletion
    /// cascade). Returns the number of rows removed; zero when none
    /// exist.
    pub async fn delete_password_history(&self, user_id: Uuid) -> IdentraResult<u64> {
        self.history_repo.delete_for_user(user_id).await
    }
}
