//! Application Layer
//!
//! Token verification and role checks.

pub mod authorize;
pub mod config;
pub mod token;

// Re-exports
pub use authorize::AuthorizeUseCase;
pub use config::AuthConfig;
pub use token::{sign_token, verify_token};
