//! Identity Entity
//!
//! The authenticated caller attached to each request by the gate.

use kernel::id::UserId;

use crate::domain::value_object::user_role::UserRole;

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
    /// Token expiry (unix ms)
    pub expires_at_ms: i64,
}

impl Identity {
    pub fn new(user_id: UserId, role: UserRole, expires_at_ms: i64) -> Self {
        Self {
            user_id,
            role,
            expires_at_ms,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
