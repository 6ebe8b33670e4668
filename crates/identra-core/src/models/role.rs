//! Role domain model.
//!
//! Roles form a closed set with a total rank order used by the
//! permission evaluator: `User < Admin < SuperAdmin`. The derived
//! `Ord` relies on variant declaration order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::SuperAdmin => "SuperAdmin",
        }
    }

    /// Parse a stored role name. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "User" => Some(Role::User),
            "Admin" => Some(Role::Admin),
            "SuperAdmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
