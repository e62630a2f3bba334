//! Auth configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file,
//! `IREPORT__*` environment variables (`IREPORT__TOKEN__TTL_HOURS=24`), then the
//! conventional `JWT_SECRET`, `JWT_EXPIRE_HOURS` and `IREPORT_API_BASE_URL`.

use crate::error::{AuthError, AuthResult};
use crate::token::TokenConfig;
use ireport_core::config_error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Remote identity API. When set, logins go there and never to the local store.
    pub api_base_url: Option<String>,
    pub token: TokenConfig,
    /// Initial password of the seeded administrator
    pub bootstrap_admin_password: String,
    pub request_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            token: TokenConfig::default(),
            bootstrap_admin_password: "admin123".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl AuthConfig {
    pub fn load(path: Option<&Path>) -> AuthResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("IREPORT")
                .separator("__")
                .try_parsing(true),
        );

        let overrides = [
            ("token.secret", std::env::var("JWT_SECRET").ok()),
            ("token.ttl_hours", std::env::var("JWT_EXPIRE_HOURS").ok()),
            ("api_base_url", std::env::var("IREPORT_API_BASE_URL").ok()),
        ];
        for (key, value) in overrides {
            builder = builder
                .set_override_option(key, value)
                .map_err(Self::config_failure)?;
        }

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(Self::config_failure)?;
        config.token.ttl()?;
        Ok(config)
    }

    fn config_failure(e: config::ConfigError) -> AuthError {
        AuthError::Storage(config_error!(
            format!("Invalid auth configuration: {}", e),
            "auth_config"
        ))
    }

    /// Configured remote base URL without a trailing slash; blank counts as unset
    pub fn remote_base_url(&self) -> Option<&str> {
        self.api_base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
