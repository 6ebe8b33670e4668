//! The acting principal and permission-decision types.
//!
//! Every policy operation takes the principal as an explicit parameter
//! rather than reading ambient request state, so the policy engine is
//! testable as plain functions over values.

use uuid::Uuid;

use crate::models::role::Role;

/// The authenticated actor behind a request: a user id plus the role
/// claims carried by its validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: Uuid, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    /// Highest-ranked role claim, used for hierarchy comparison.
    /// `None` when the principal carries no role at all.
    pub fn highest_role(&self) -> Option<Role> {
        self.roles.iter().copied().max()
    }
}

/// Outcome of a permission check. Transient, never persisted.
#[derive(Debug, Clone)]
pub struct PermissionDecision {
    allowed: bool,
    reasons: Vec<String>,
}

impl PermissionDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reasons: Vec::new(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reasons: vec![reason.into()],
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}
