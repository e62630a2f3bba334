//! Client session
//!
//! [`SessionManager`] owns the current identity and token of a client process
//! and drives the session state machine:
//!
//! ```text
//! LoggedOut --login--> Authenticating --ok--> LoggedIn --logout--> LoggedOut
//!                            |
//!                            +--error--> LoggedOut
//! ```
//!
//! Identity and token are persisted under [`keys::CURRENT_USER`] and
//! [`keys::AUTH_TOKEN`] so a restarted client resumes its session.

use crate::authenticator::Authenticator;
use crate::authorizer;
use crate::error::{AuthError, AuthResult};
use crate::identity::{Identity, ProfileUpdate};
use crate::role::{AccountClass, Permission};
use crate::storage::{keys, KeyValueStorage};
use crate::store::CredentialStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Authenticating,
    LoggedIn,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    identity: Option<Identity>,
    token: Option<String>,
}

impl Inner {
    fn logged_out() -> Self {
        Self {
            state: SessionState::LoggedOut,
            identity: None,
            token: None,
        }
    }
}

pub struct SessionManager<S> {
    storage: Arc<S>,
    store: Arc<dyn CredentialStore>,
    authenticator: Arc<dyn Authenticator>,
    inner: RwLock<Inner>,
}

impl<S: KeyValueStorage> SessionManager<S> {
    pub fn new(
        storage: Arc<S>,
        store: Arc<dyn CredentialStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            storage,
            store,
            authenticator,
            inner: RwLock::new(Inner::logged_out()),
        }
    }

    /// Seed the local store and restore a persisted session.
    ///
    /// The session resumes only when both the identity and the token are
    /// present; a corrupt identity blob is discarded.
    pub async fn init(&self) -> AuthResult<SessionState> {
        self.store.ensure_default_admin().await?;

        let identity_blob = self.storage.get(keys::CURRENT_USER).await?;
        let token = self.storage.get(keys::AUTH_TOKEN).await?;

        let mut inner = self.inner.write().await;
        match (identity_blob, token) {
            (Some(blob), Some(token)) => match serde_json::from_str::<Identity>(&blob) {
                Ok(identity) => {
                    info!(id = %identity.id, "Restored session");
                    *inner = Inner {
                        state: SessionState::LoggedIn,
                        identity: Some(identity),
                        token: Some(token),
                    };
                }
                Err(e) => {
                    warn!("Discarding unreadable session: {}", e);
                    self.clear_persisted().await?;
                    *inner = Inner::logged_out();
                }
            },
            _ => {
                debug!("No persisted session");
                *inner = Inner::logged_out();
            }
        }
        Ok(inner.state)
    }

    /// Authenticate and, on success, persist the new session.
    ///
    /// Any failure leaves the session logged out with nothing persisted.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Identity> {
        {
            let mut inner = self.inner.write().await;
            if inner.state == SessionState::Authenticating {
                return Err(AuthError::Validation("a login is already in progress".to_string()));
            }
            *inner = Inner {
                state: SessionState::Authenticating,
                identity: None,
                token: None,
            };
        }

        let outcome = match self.authenticator.login(email, password).await {
            Ok(authenticated) => self
                .persist(&authenticated.identity, &authenticated.token)
                .await
                .map(|_| authenticated),
            Err(e) => Err(e),
        };

        let mut inner = self.inner.write().await;
        match outcome {
            Ok(authenticated) => {
                *inner = Inner {
                    state: SessionState::LoggedIn,
                    identity: Some(authenticated.identity.clone()),
                    token: Some(authenticated.token),
                };
                Ok(authenticated.identity)
            }
            Err(e) => {
                *inner = Inner::logged_out();
                if let Err(clear_err) = self.clear_persisted().await {
                    warn!("Failed to clear session after failed login: {}", clear_err);
                }
                Err(e)
            }
        }
    }

    /// Drop the current session. The token is simply discarded.
    pub async fn logout(&self) -> AuthResult<()> {
        let mut inner = self.inner.write().await;
        self.clear_persisted().await?;
        if let Some(identity) = &inner.identity {
            info!(id = %identity.id, "Logged out");
        }
        *inner = Inner::logged_out();
        Ok(())
    }

    /// Merge `update` into the current identity and write it back to both the
    /// session blob and the credential list it belongs to.
    pub async fn update_current_user(&self, update: ProfileUpdate) -> AuthResult<Identity> {
        let mut inner = self.inner.write().await;
        if inner.state != SessionState::LoggedIn {
            return Err(AuthError::NotAuthenticated);
        }
        let Some(current) = inner.identity.as_ref() else {
            return Err(AuthError::NotAuthenticated);
        };

        let mut updated = current.clone();
        updated.apply(update);

        // List record first: a failed write must leave the blob and memory untouched
        match self.store.update(updated.clone()).await {
            Ok(_) => {}
            // Remote identities have no local record
            Err(AuthError::NotFound(_)) => {
                debug!(id = %updated.id, "No local record to update");
            }
            Err(e) => return Err(e),
        }

        let blob = serde_json::to_string(&updated).map_err(ireport_core::IReportError::from)?;
        self.storage.set(keys::CURRENT_USER, blob).await?;

        inner.identity = Some(updated.clone());
        Ok(updated)
    }

    pub async fn current(&self) -> Option<Identity> {
        self.inner.read().await.identity.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn check_permission(&self, permission: Permission) -> bool {
        self.inner
            .read()
            .await
            .identity
            .as_ref()
            .is_some_and(|identity| authorizer::has_permission(identity, permission))
    }

    pub async fn can_access_full_dashboard(&self) -> bool {
        self.inner
            .read()
            .await
            .identity
            .as_ref()
            .is_some_and(|identity| authorizer::can_access_full_dashboard(identity.role))
    }

    /// The current identity when it is a staff member
    pub async fn staff_member(&self) -> Option<Identity> {
        self.current()
            .await
            .filter(|identity| identity.account_class() == AccountClass::Staff)
    }

    /// The current identity when it is a student
    pub async fn student(&self) -> Option<Identity> {
        self.current()
            .await
            .filter(|identity| identity.account_class() == AccountClass::Student)
    }

    async fn persist(&self, identity: &Identity, token: &str) -> AuthResult<()> {
        let blob = serde_json::to_string(identity).map_err(ireport_core::IReportError::from)?;
        self.storage.set(keys::CURRENT_USER, blob).await?;
        self.storage.set(keys::AUTH_TOKEN, token.to_string()).await?;
        Ok(())
    }

    async fn clear_persisted(&self) -> AuthResult<()> {
        self.storage.remove(keys::CURRENT_USER).await?;
        self.storage.remove(keys::AUTH_TOKEN).await?;
        Ok(())
    }
}
