//! iReport Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use ireport_auth::{AuthConfig, DEFAULT_SECRET};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main iReport web server
pub struct IReportServer {
    config: WebConfig,
    state: AppState,
}

impl IReportServer {
    /// Create a new server, opening the identity store.
    ///
    /// Outside development mode the built-in token secret is refused.
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        if config.auth.token.secret == DEFAULT_SECRET {
            if !config.dev_mode {
                return Err(WebError::Config(
                    "JWT_SECRET must be set unless running in development mode".to_string(),
                ));
            }
            warn!("Development mode: signing tokens with the built-in secret");
        }

        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);
        info!("Development mode: {}", self.config.dev_mode);

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> WebResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = create_app(self.state);

        if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down gracefully");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Builder for IReportServer
pub struct IReportServerBuilder {
    config: WebConfig,
}

impl IReportServerBuilder {
    /// Start from an existing configuration
    pub fn new(config: WebConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database_url = Some(database_url.into());
        self
    }

    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<IReportServer> {
        IReportServer::new(self.config).await
    }
}

impl Default for IReportServerBuilder {
    fn default() -> Self {
        Self::new(WebConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> WebConfig {
        WebConfig {
            dev_mode: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = IReportServer::new(dev_config()).await;
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn default_secret_needs_dev_mode() {
        let result = IReportServer::new(WebConfig::default()).await;
        assert!(matches!(result, Err(WebError::Config(_))));

        let mut config = WebConfig::default();
        config.auth.token.secret = "production-secret".to_string();
        assert!(IReportServer::new(config).await.is_ok());
    }

    #[test]
    fn test_server_builder() {
        let builder = IReportServerBuilder::default()
            .host("localhost")
            .port(3000)
            .dev_mode(true);

        assert_eq!(builder.config.host, "localhost");
        assert_eq!(builder.config.port, 3000);
        assert!(builder.config.dev_mode);
    }

    #[tokio::test]
    async fn test_server_stops_on_shutdown_signal() {
        let server = IReportServer::new(dev_config()).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = server.serve(listener, async {}).await;
        assert!(result.is_ok());
    }
}
