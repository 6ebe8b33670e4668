//! Permission-gated account mutations.
//!
//! Every sensitive mutation follows one template: authorize the acting
//! principal for the target id, look the target up, check the
//! operation's precondition, mutate, and append an audit entry. The
//! template lives in [`AccountService::authorize`] rather than being
//! repeated per operation.

use tracing::warn;
use uuid::Uuid;

use identra_core::error::IdentraResult;
use identra_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use identra_core::models::role::Role;
use identra_core::models::user::{AccountStatus, UpdateUser, User};
use identra_core::principal::Principal;
use identra_core::repository::{AuditLogRepository, PasswordHistoryRepository, UserRepository};

use crate::cleanup::PasswordHistoryCleanup;
use crate::error::AuthError;
use crate::permission::PermissionEvaluator;

/// Profile-field updates. Status and roles are mutated through the
/// dedicated gated operations, never through this struct.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

pub struct AccountService<U, H, A>
where
    U: UserRepository,
    H: PasswordHistoryRepository,
    A: AuditLogRepository,
{
    user_repo: U,
    permissions: PermissionEvaluator<U>,
    cleanup: PasswordHistoryCleanup<H>,
    audit: A,
}

impl<U, H, A> AccountService<U, H, A>
where
    U: UserRepository + Clone,
    H: PasswordHistoryRepository,
    A: AuditLogRepository,
{
    pub fn new(user_repo: U, history_repo: H, audit: A, history_retention: usize) -> Self {
        Self {
            permissions: PermissionEvaluator::new(user_repo.clone()),
            cleanup: PasswordHistoryCleanup::new(history_repo, history_retention),
            user_repo,
            audit,
        }
    }
}

impl<U, H, A> AccountService<U, H, A>
where
    U: UserRepository,
    H: PasswordHistoryRepository,
    A: AuditLogRepository,
{
    /// The shared mutation gate: permission check, then target lookup.
    ///
    /// A denial is audited as `Denied` and reported as `Forbidden`; a
    /// missing target propagates as not-found (the permission check ran
    /// first, so a 403 wins over a 404 for under-ranked actors).
    async fn authorize(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
        action: &str,
    ) -> IdentraResult<User> {
        let decision = self.permissions.evaluate(principal, target_id).await?;
        if !decision.is_allowed() {
            self.record_audit(principal, action, Some(target_id), AuditOutcome::Denied)
                .await;
            return Err(AuthError::Forbidden.into());
        }

        self.user_repo.get_by_id(target_id).await
    }

    /// Best-effort audit append: a failed write is logged, not
    /// propagated — the mutation it describes has already happened.
    async fn record_audit(
        &self,
        principal: Option<&Principal>,
        action: &str,
        target_id: Option<Uuid>,
        outcome: AuditOutcome,
    ) {
        let Some(principal) = principal else { return };

        let entry = CreateAuditLogEntry {
            actor_id: principal.user_id,
            action: action.to_string(),
            target_id,
            outcome,
            ip_address: None,
            metadata: None,
        };
        if let Err(e) = self.audit.append(entry).await {
            warn!(error = %e, action, "failed to append audit log entry");
        }
    }

    /// Update profile fields on the target account.
    pub async fn update_profile(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
        input: UpdateProfile,
    ) -> IdentraResult<User> {
        self.authorize(principal, target_id, "user.update").await?;

        let updated = self
            .user_repo
            .update(
                target_id,
                UpdateUser {
                    username: input.username,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    email: input.email,
                    phone_number: input.phone_number,
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(principal, "user.update", Some(target_id), AuditOutcome::Success)
            .await;
        Ok(updated)
    }

    /// Delete the target account and erase its password history.
    pub async fn delete_account(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
    ) -> IdentraResult<()> {
        self.authorize(principal, target_id, "user.delete").await?;

        self.user_repo.delete(target_id).await?;
        self.cleanup.delete_password_history(target_id).await?;

        self.record_audit(principal, "user.delete", Some(target_id), AuditOutcome::Success)
            .await;
        Ok(())
    }

    /// Activate the target account.
    pub async fn activate(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
    ) -> IdentraResult<User> {
        let user = self.authorize(principal, target_id, "user.activate").await?;

        if user.status == AccountStatus::Active {
            return Err(AuthError::AlreadyActive.into());
        }

        let updated = self
            .user_repo
            .update(
                target_id,
                UpdateUser {
                    status: Some(AccountStatus::Active),
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(principal, "user.activate", Some(target_id), AuditOutcome::Success)
            .await;
        Ok(updated)
    }

    /// Deactivate the target account.
    pub async fn deactivate(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
    ) -> IdentraResult<User> {
        let user = self
            .authorize(principal, target_id, "user.deactivate")
            .await?;

        if user.status == AccountStatus::Inactive {
            return Err(AuthError::AlreadyInactive.into());
        }

        let updated = self
            .user_repo
            .update(
                target_id,
                UpdateUser {
                    status: Some(AccountStatus::Inactive),
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(
            principal,
            "user.deactivate",
            Some(target_id),
            AuditOutcome::Success,
        )
        .await;
        Ok(updated)
    }

    /// Assign a role to the target account. Role assignment requires an
    /// active account.
    pub async fn assign_role(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
        role: Role,
    ) -> IdentraResult<User> {
        let user = self
            .authorize(principal, target_id, "user.assign_role")
            .await?;

        if user.status != AccountStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }
        if user.roles.contains(&role) {
            return Err(AuthError::RoleAlreadyAssigned.into());
        }

        let mut roles = user.roles;
        roles.push(role);

        let updated = self
            .user_repo
            .update(
                target_id,
                UpdateUser {
                    roles: Some(roles),
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(
            principal,
            "user.assign_role",
            Some(target_id),
            AuditOutcome::Success,
        )
        .await;
        Ok(updated)
    }

    /// Remove a role from the target account.
    pub async fn remove_role(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
        role: Role,
    ) -> IdentraResult<User> {
        let user = self
            .authorize(principal, target_id, "user.remove_role")
            .await?;

        if !user.roles.contains(&role) {
            return Err(AuthError::RoleNotAssigned.into());
        }

        let roles: Vec<Role> = user.roles.into_iter().filter(|r| *r != role).collect();

        let updated = self
            .user_repo
            .update(
                target_id,
                UpdateUser {
                    roles: Some(roles),
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(
            principal,
            "user.remove_role",
            Some(target_id),
            AuditOutcome::Success,
        )
        .await;
        Ok(updated)
    }
}
