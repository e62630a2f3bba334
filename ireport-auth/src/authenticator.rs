//! Email/password authentication strategies
//!
//! Exactly one strategy is built at startup: [`RemoteAuthenticator`] when an
//! identity API is configured, [`LocalAuthenticator`] otherwise. A login never
//! consults both.

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;
use crate::password;
use crate::role::{AccountClass, Role};
use crate::store::CredentialStore;
use crate::token::TokenService;
use crate::wire::{LoginRequest, LoginResponse, WireUser};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A verified identity and the token proving it
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub identity: Identity,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Local,
    Remote,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Local => write!(f, "local"),
            AuthMode::Remote => write!(f, "remote"),
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify credentials. Every rejection is [`AuthError::InvalidCredentials`]
    /// with the same message, whichever part was wrong.
    async fn login(&self, email: &str, password: &str) -> AuthResult<Authenticated>;

    fn mode(&self) -> AuthMode;
}

/// Verifies against a [`CredentialStore`] and issues tokens itself
pub struct LocalAuthenticator {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
}

impl LocalAuthenticator {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }
}

#[async_trait]
impl Authenticator for LocalAuthenticator {
    async fn login(&self, email: &str, password: &str) -> AuthResult<Authenticated> {
        let mut verified_any = false;

        // Staff first, then students
        for class in [AccountClass::Staff, AccountClass::Student] {
            let Some(identity) = self.store.find_by_email_and_role(email, class).await? else {
                continue;
            };

            verified_any = true;
            let password_ok = identity.verify_password(password);
            if password_ok && identity.is_active {
                let token = self.tokens.issue(&identity)?;
                info!(id = %identity.id, role = %identity.role, "Login succeeded");
                return Ok(Authenticated { identity, token });
            }
            if password_ok {
                debug!(id = %identity.id, "Login rejected: account inactive");
            }
        }

        if !verified_any {
            password::verify_dummy(password);
        }

        debug!("Login rejected: invalid credentials");
        Err(AuthError::InvalidCredentials)
    }

    fn mode(&self) -> AuthMode {
        AuthMode::Local
    }
}

/// Delegates to the backend's `/api/auth/login` and adopts its token
pub struct RemoteAuthenticator {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteAuthenticator {
    pub fn new(base_url: &str, timeout: Duration) -> AuthResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Local view of a remotely authenticated user. Carries no password hash.
fn synthesize_identity(user: WireUser) -> Identity {
    let now = Utc::now();
    Identity {
        id: user.id,
        display_name: user.name,
        email: user.email,
        school_email: None,
        role: Role::from_remote(&user.role),
        password_hash: String::new(),
        permissions: BTreeSet::new(),
        is_active: true,
        phone: None,
        profile_image: None,
        staff_id: None,
        student_id: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn login(&self, email: &str, password: &str) -> AuthResult<Authenticated> {
        let url = format!("{}/api/auth/login", self.base_url);
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, "Identity API request failed: {}", e);
                AuthError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        if status.is_client_error() {
            debug!(status = %status, "Identity API rejected credentials");
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            warn!(status = %status, "Identity API returned an error");
            return Err(AuthError::UpstreamUnavailable(format!(
                "identity API returned {}",
                status
            )));
        }

        let body: LoginResponse = response.json().await.map_err(|e| {
            warn!("Undecodable identity API response: {}", e);
            AuthError::UpstreamUnavailable("undecodable identity API response".to_string())
        })?;

        let identity = synthesize_identity(body.user);
        info!(id = %identity.id, role = %identity.role, "Remote login succeeded");
        Ok(Authenticated {
            identity,
            token: body.token,
        })
    }

    fn mode(&self) -> AuthMode {
        AuthMode::Remote
    }
}

/// Pick the login strategy from configuration
pub fn build_authenticator(
    config: &AuthConfig,
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
) -> AuthResult<Arc<dyn Authenticator>> {
    match config.remote_base_url() {
        Some(base_url) => {
            info!(base_url, "Using remote identity API");
            Ok(Arc::new(RemoteAuthenticator::new(
                base_url,
                config.request_timeout(),
            )?))
        }
        None => {
            info!("Using local credential store");
            Ok(Arc::new(LocalAuthenticator::new(store, tokens)))
        }
    }
}
