use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of roles a bearer token can carry.
///
/// Authorization is data-driven: every route group declares the roles it
/// admits as a `&'static [UserRole]` and the gate calls [`UserRole::is_allowed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum UserRole {
    #[default]
    Participant = 0,
    Validator = 1,
    Admin = 2,
}

impl UserRole {
    pub const ALL: &'static [UserRole] = &[UserRole::Participant, UserRole::Validator, UserRole::Admin];

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Participant => "participant",
            Validator => "validator",
            Admin => "admin",
        }
    }

    #[inline]
    pub const fn from_id(id: i16) -> Option<Self> {
        use UserRole::*;
        match id {
            0 => Some(Participant),
            1 => Some(Validator),
            2 => Some(Admin),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use UserRole::*;
        match code {
            "participant" => Some(Participant),
            "validator" => Some(Validator),
            "admin" => Some(Admin),
            _ => None,
        }
    }

    /// Capability check against an endpoint's allow-list.
    #[inline]
    pub fn is_allowed(&self, required: &[UserRole]) -> bool {
        required.contains(self)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
