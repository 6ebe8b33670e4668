//! Permission evaluation — decides whether an acting principal may
//! operate on a target user.
//!
//! The hierarchy is `User < Admin < SuperAdmin`. Self-access is always
//! permitted. For distinct ids the acting principal's highest role must
//! strictly outrank every role the target holds, with one exception:
//! a SuperAdmin may act on anyone, other SuperAdmins included.

use uuid::Uuid;

use identra_core::error::{IdentraError, IdentraResult};
use identra_core::models::role::Role;
use identra_core::principal::{PermissionDecision, Principal};
use identra_core::repository::UserRepository;

/// Evaluates permission checks against the user store.
///
/// Generic over the repository implementation so the policy layer has
/// no dependency on the database crate.
pub struct PermissionEvaluator<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> PermissionEvaluator<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    /// Decide whether `principal` may operate on the user identified by
    /// `target_id`.
    ///
    /// Business denials come back as `Ok` with a denied decision; `Err`
    /// is reserved for store failures other than a missing target.
    pub async fn evaluate(
        &self,
        principal: Option<&Principal>,
        target_id: Uuid,
    ) -> IdentraResult<PermissionDecision> {
        // 1. No authenticated principal: fail closed before anything else.
        let Some(principal) = principal else {
            return Ok(PermissionDecision::denied("no authenticated principal"));
        };

        // 2. Self-access is always permitted, regardless of role and of
        //    whether the target exists.
        if principal.user_id == target_id {
            return Ok(PermissionDecision::allowed());
        }

        // 3. Acting on someone else requires the target to exist.
        let target = match self.user_repo.get_by_id(target_id).await {
            Ok(user) => user,
            Err(IdentraError::NotFound { .. }) => {
                return Ok(PermissionDecision::denied("target user does not exist"));
            }
            Err(e) => return Err(e),
        };

        // 4. A role-less actor can access nothing but itself.
        let Some(acting_role) = principal.highest_role() else {
            return Ok(PermissionDecision::denied("principal holds no role"));
        };

        // 5. SuperAdmin may act on anyone, other SuperAdmins included.
        if acting_role == Role::SuperAdmin {
            return Ok(PermissionDecision::allowed());
        }

        // 6. Otherwise the acting role must strictly outrank every role
        //    the target holds. Equal rank on distinct ids is denied.
        if target.roles.iter().all(|role| acting_role > *role) {
            Ok(PermissionDecision::allowed())
        } else {
            Ok(PermissionDecision::denied(format!(
                "role {acting_role} does not outrank target user"
            )))
        }
    }
}
