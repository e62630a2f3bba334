//! Signed session tokens (HS256 JWT)

use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;
use crate::role::Role;
use chrono::{Duration, Utc};
use ireport_core::config_error;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Secret used when none is configured. Only acceptable in development.
pub const DEFAULT_SECRET: &str = "ireport-default-secret-change-in-production";

/// Default token lifetime: 7 days
pub const DEFAULT_TTL_HOURS: i64 = 24 * 7;

/// Longest accepted token lifetime: one year
pub const MAX_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

impl TokenConfig {
    /// Lifetime as a duration; must be positive and at most [`MAX_TTL_HOURS`]
    pub fn ttl(&self) -> AuthResult<Duration> {
        if !(1..=MAX_TTL_HOURS).contains(&self.ttl_hours) {
            return Err(AuthError::Storage(config_error!(
                format!(
                    "token ttl_hours must be between 1 and {}, got {}",
                    MAX_TTL_HOURS, self.ttl_hours
                ),
                "token"
            )));
        }
        Duration::try_hours(self.ttl_hours).ok_or_else(|| {
            AuthError::Storage(config_error!("token ttl_hours out of range", "token"))
        })
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
struct Claims {
    /// Identity id
    sub: String,
    email: String,
    role: Role,
    /// Issued at (timestamp)
    iat: i64,
    /// Expiration time (timestamp)
    exp: i64,
}

/// What a verified token proves about its bearer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Issues and verifies session tokens with a single shared secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> AuthResult<Self> {
        let ttl = config.ttl()?;
        if config.secret == DEFAULT_SECRET {
            warn!("Using the default token secret; set JWT_SECRET in production");
        }
        Ok(Self::with_ttl(&config.secret, ttl))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token naming `identity` that expires after the configured lifetime
    pub fn issue(&self, identity: &Identity) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            warn!("Failed to encode session token: {}", e);
            AuthError::Internal("token creation failed".to_string())
        })
    }

    /// Check signature and expiry. Any failure is [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Token verification failed: {}", e);
            AuthError::InvalidToken
        })?;

        Ok(SessionClaims {
            id: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}
