//! Domain Layer
//!
//! Contains the caller identity and the closed role enumeration.

pub mod entity;
pub mod value_object;

// Re-exports
pub use entity::identity::Identity;
pub use value_object::user_role::UserRole;
