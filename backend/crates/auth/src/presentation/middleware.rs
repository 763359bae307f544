//! Auth Middleware
//!
//! Role gate for protected route groups and the [`Identity`] extractor.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use platform::bearer::extract_bearer_token;
use std::sync::Arc;

use crate::application::AuthorizeUseCase;
use crate::application::config::AuthConfig;
use crate::domain::{Identity, UserRole};
use crate::error::AuthError;

/// Middleware state: the verifier config plus the route group's allow-list
#[derive(Clone)]
pub struct RoleGate {
    pub config: Arc<AuthConfig>,
    pub allowed: &'static [UserRole],
}

impl RoleGate {
    pub fn new(config: Arc<AuthConfig>, allowed: &'static [UserRole]) -> Self {
        Self { config, allowed }
    }

    /// Same verifier, different allow-list
    pub fn allowing(&self, allowed: &'static [UserRole]) -> Self {
        Self {
            config: self.config.clone(),
            allowed,
        }
    }
}

/// Middleware that requires a valid bearer token whose role is admitted.
///
/// On success the caller's [`Identity`] is stored in request extensions.
///
/// ```rust,ignore
/// router.route_layer(axum::middleware::from_fn_with_state(gate, require_roles))
/// ```
pub async fn require_roles(
    State(gate): State<RoleGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = {
        let token = extract_bearer_token(req.headers())?;
        AuthorizeUseCase::new(gate.config.clone()).execute(token, gate.allowed)?
    };

    tracing::debug!(user_id = %identity.user_id, role = %identity.role, "Request authorized");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().copied().ok_or_else(|| {
            AuthError::Internal("Identity requested on a route without a role gate".to_string())
        })
    }
}
