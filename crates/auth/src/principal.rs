use serde::{Deserialize, Serialize};

use jobboard_core::UserId;

use crate::Role;

/// Authenticated identity derived from a verified session token.
///
/// Rebuilt on every request and never persisted. The role is fixed for the
/// lifetime of the token; a role change takes effect on the next sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(subject_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id,
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this principal is the given owner.
    pub fn owns(&self, owner_id: Option<UserId>) -> bool {
        owner_id == Some(self.subject_id)
    }
}
