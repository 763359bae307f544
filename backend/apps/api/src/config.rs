//! Server Configuration
//!
//! Environment-driven settings for the composition root.

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use gamification::GamificationConfig;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    pub gamification: GamificationConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: parsed_or("BIND_ADDR", DEFAULT_BIND_ADDR.parse()?)?,
            frontend_origins,
            auth: auth_config()?,
            gamification: gamification_config()?,
        })
    }
}

/// Token secret from `AUTH_TOKEN_SECRET`; debug builds fall back to a random key.
fn auth_config() -> anyhow::Result<AuthConfig> {
    let secret_b64 = match env::var("AUTH_TOKEN_SECRET") {
        Ok(value) => value,
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("AUTH_TOKEN_SECRET not set, using a random development secret");
            return Ok(AuthConfig::development());
        }
        Err(_) => bail!("AUTH_TOKEN_SECRET must be set in production"),
    };

    let secret_bytes = general_purpose::STANDARD
        .decode(secret_b64.trim())
        .context("AUTH_TOKEN_SECRET must be base64")?;
    let secret: [u8; 32] = secret_bytes.try_into().map_err(|bytes: Vec<u8>| {
        anyhow::anyhow!(
            "AUTH_TOKEN_SECRET must decode to 32 bytes, got {}",
            bytes.len()
        )
    })?;

    Ok(AuthConfig::with_secret(secret))
}

/// Page sizes; debug builds start from the smaller development pages.
fn gamification_config() -> anyhow::Result<GamificationConfig> {
    let base = if cfg!(debug_assertions) {
        GamificationConfig::development()
    } else {
        GamificationConfig::default()
    };

    Ok(GamificationConfig {
        global_ranking_limit: parsed_or("RANKING_PAGE_SIZE", base.global_ranking_limit)?,
        mission_ranking_limit: parsed_or("MISSION_RANKING_SIZE", base.mission_ranking_limit)?,
        ..base
    })
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_or_falls_back_when_unset() {
        let value: i64 = parsed_or("API_CONFIG_TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_debug_build_uses_development_pages() {
        let config = gamification_config().unwrap();
        let development = GamificationConfig::development();
        assert_eq!(config.point_history_limit, development.point_history_limit);
        assert_eq!(config.pending_queue_limit, development.pending_queue_limit);
    }
}
