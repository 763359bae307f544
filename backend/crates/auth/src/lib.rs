//! Auth Gate
//!
//! Clean Architecture structure:
//! - `domain/` - caller identity and the closed role enumeration
//! - `application/` - token verification and role checks
//! - `presentation/` - axum middleware and extractor
//!
//! ## Security Model
//! - Bearer tokens are HMAC-SHA256 signed (user id, role, expiry); issuance
//!   and refresh are owned by an external identity service sharing the key
//! - Every protected route group declares its admitted roles as data
//! - Handlers receive the verified [`Identity`] from request extensions

pub mod application;
pub mod domain;
pub mod error;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use domain::{Identity, UserRole};
pub use error::{AuthError, AuthResult};
pub use presentation::middleware::{RoleGate, require_roles};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
