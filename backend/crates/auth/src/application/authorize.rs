//! Authorize Use Case
//!
//! Turns a raw bearer token into an [`Identity`] admitted by an allow-list.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::verify_token;
use crate::domain::{Identity, UserRole};
use crate::error::{AuthError, AuthResult};

/// Authorize use case
pub struct AuthorizeUseCase {
    config: Arc<AuthConfig>,
}

impl AuthorizeUseCase {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    /// Verify the token and check the caller's role against `allowed`.
    pub fn execute(&self, token: &str, allowed: &[UserRole]) -> AuthResult<Identity> {
        let identity = verify_token(token, &self.config.token_secret)?;

        if !identity.role.is_allowed(allowed) {
            tracing::warn!(
                user_id = %identity.user_id,
                role = %identity.role,
                "Role not admitted for this route"
            );
            return Err(AuthError::InsufficientRole);
        }

        Ok(identity)
    }
}
