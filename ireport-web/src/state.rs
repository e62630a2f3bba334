//! Shared application state

use crate::{WebConfig, WebResult};
use ireport_auth::{
    Authenticator, BlobCredentialStore, CredentialStore, LocalAuthenticator, MemoryStorage,
    TokenService,
};
use std::sync::Arc;
use tracing::info;

/// Immutable per-process state; only the store behind it changes
#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub store: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenService>,
    /// The backend is the identity authority, so it always verifies locally
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    /// Create a new application state and seed the default administrator
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let store = Self::open_store(&config).await?;
        Self::with_store(config, store).await
    }

    pub async fn with_store(config: WebConfig, store: Arc<dyn CredentialStore>) -> WebResult<Self> {
        if store.ensure_default_admin().await? {
            info!("Default administrator created; change its password");
        }

        let tokens = Arc::new(TokenService::new(&config.auth.token)?);
        let authenticator: Arc<dyn Authenticator> =
            Arc::new(LocalAuthenticator::new(store.clone(), tokens.clone()));

        Ok(Self {
            config,
            store,
            tokens,
            authenticator,
        })
    }

    async fn open_store(config: &WebConfig) -> WebResult<Arc<dyn CredentialStore>> {
        let bootstrap = config.auth.bootstrap_admin_password.clone();

        #[cfg(feature = "sqlite")]
        if let Some(database_url) = &config.database_url {
            let store = ireport_auth::SqliteCredentialStore::connect(database_url, bootstrap).await?;
            info!("Identity store: sqlite");
            return Ok(Arc::new(store));
        }

        #[cfg(not(feature = "sqlite"))]
        if config.database_url.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without the sqlite feature");
        }

        info!("Identity store: in-memory");
        Ok(Arc::new(BlobCredentialStore::new(
            Arc::new(MemoryStorage::new()),
            bootstrap,
        )))
    }
}
