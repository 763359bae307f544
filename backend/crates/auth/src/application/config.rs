//! Application Configuration
//!
//! Configuration for the bearer gate.

use std::time::Duration;

/// Auth gate configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC signing (32 bytes), shared with the token issuer
    pub token_secret: [u8; 32],
    /// Lifetime of tokens minted by [`crate::application::token::sign_token`]
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            token_ttl: Duration::from_secs(12 * 3600), // 12 hours
        }
    }
}

impl AuthConfig {
    pub fn with_secret(token_secret: [u8; 32]) -> Self {
        Self {
            token_secret,
            ..Default::default()
        }
    }

    /// Create config with a random secret (for development)
    pub fn with_random_secret() -> Self {
        Self::with_secret(platform::crypto::random_key())
    }

    /// Create config for development (random secret, short-lived tokens)
    pub fn development() -> Self {
        Self {
            token_ttl: Duration::from_secs(3600),
            ..Self::with_random_secret()
        }
    }

    pub fn token_ttl_ms(&self) -> i64 {
        self.token_ttl.as_millis() as i64
    }
}
