//! Password service — set-password (first-time credential) and
//! update-password (authenticated rotation) orchestration.

use uuid::Uuid;

use identra_core::error::{IdentraError, IdentraResult};
use identra_core::principal::Principal;
use identra_core::repository::{PasswordHistoryRepository, UserRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::history::PasswordHistoryService;
use crate::password;
use crate::permission::PermissionEvaluator;

/// Input for first-time password establishment.
#[derive(Debug)]
pub struct SetPasswordInput {
    pub password: String,
    pub password_confirmed: String,
}

/// Input for authenticated password rotation.
#[derive(Debug)]
pub struct UpdatePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Orchestrates the two password-mutation entry points, composing the
/// permission evaluator, user store, hasher, and history service.
pub struct PasswordService<U: UserRepository, H: PasswordHistoryRepository> {
    user_repo: U,
    permissions: PermissionEvaluator<U>,
    history: PasswordHistoryService<H>,
    config: AuthConfig,
}

impl<U, H> PasswordService<U, H>
where
    U: UserRepository + Clone,
    H: PasswordHistoryRepository + Clone,
{
    pub fn new(user_repo: U, history_repo: H, config: AuthConfig) -> Self {
        Self {
            permissions: PermissionEvaluator::new(user_repo.clone()),
            history: PasswordHistoryService::new(
                history_repo,
                config.pepper.clone(),
                config.password_history_window,
            ),
            user_repo,
            config,
        }
    }
}

impl<U: UserRepository, H: PasswordHistoryRepository> PasswordService<U, H> {
    /// Attach the first password to an account.
    ///
    /// Used by the account-activation flow, where the target has no
    /// credentials yet — the permission check is intentionally skipped.
    /// One-time-use per account: fails once a password hash exists.
    pub async fn set_password(&self, target_id: Uuid, input: SetPasswordInput) -> IdentraResult<()> {
        if input.password.trim().is_empty() || input.password_confirmed.trim().is_empty() {
            return Err(IdentraError::validation(
                "password and confirmation must not be empty",
            ));
        }

        // 1. Confirmation must match before the store is touched.
        if input.password != input.password_confirmed {
            return Err(AuthError::PasswordMismatch.into());
        }

        // 2. Target must exist; a missing account surfaces as not-found.
        let user = self.user_repo.get_by_id(target_id).await?;

        // 3. One-time-use guard.
        if user.has_password() {
            return Err(AuthError::PasswordAlreadySet.into());
        }

        // 4. Policy, hash, store.
        if input.password.len() < self.config.min_password_length {
            return Err(AuthError::PasswordTooShort {
                min: self.config.min_password_length,
            }
            .into());
        }

        let hash = password::hash_password(&input.password, self.config.pepper.as_deref())?;
        self.user_repo.set_password_hash(target_id, &hash).await?;

        // 5. Exactly one history row per successful set.
        self.history.record(target_id, &hash).await?;

        Ok(())
    }

    /// Rotate an existing password.
    ///
    /// Lookup failure and a credential-less account report the same
    /// `InvalidCredentials` error so the endpoint does not leak whether
    /// an account exists.
    pub async fn update_password(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
        input: UpdatePasswordInput,
    ) -> IdentraResult<()> {
        if input.current_password.trim().is_empty() || input.new_password.trim().is_empty() {
            return Err(IdentraError::validation(
                "current and new password must not be empty",
            ));
        }

        // 1. Authorization gate.
        let decision = self.permissions.evaluate(principal, target_id).await?;
        if !decision.is_allowed() {
            return Err(AuthError::Forbidden.into());
        }

        // 2. Look up the target; a missing account and an account with
        //    no password report identically.
        let user = match self.user_repo.get_by_id(target_id).await {
            Ok(user) => user,
            Err(IdentraError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };
        let Some(stored_hash) = user.password_hash.filter(|h| !h.is_empty()) else {
            return Err(AuthError::InvalidCredentials.into());
        };

        // 3. Prove knowledge of the current password.
        let current_ok = password::verify_password(
            &input.current_password,
            &stored_hash,
            self.config.pepper.as_deref(),
        )?;
        if !current_ok {
            return Err(AuthError::InvalidCredentials.into());
        }

        // 4. The new password must not appear in the user's history —
        //    which always contains the current hash.
        if self
            .history
            .was_used_before(target_id, &input.new_password)
            .await?
        {
            return Err(AuthError::PasswordReuse.into());
        }

        // 5. Policy, hash, store.
        if input.new_password.len() < self.config.min_password_length {
            return Err(AuthError::PasswordTooShort {
                min: self.config.min_password_length,
            }
            .into());
        }

        let new_hash = password::hash_password(&input.new_password, self.config.pepper.as_deref())?;
        self.user_repo.set_password_hash(target_id, &new_hash).await?;

        // 6. Exactly one history row per successful update.
        self.history.record(target_id, &new_hash).await?;

        Ok(())
    }
}
