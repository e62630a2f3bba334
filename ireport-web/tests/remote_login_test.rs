//! A client session authenticating against a running backend over HTTP

mod helpers;

use helpers::{spawn_server, ADMIN_EMAIL, ADMIN_PASSWORD};
use ireport_auth::{
    build_authenticator, AuthConfig, AuthError, AuthMode, BlobCredentialStore, CredentialStore,
    Identity, MemoryStorage, Role, SessionManager, SessionState, TokenConfig, TokenService,
};
use std::sync::Arc;

fn client_session(base_url: &str) -> SessionManager<MemoryStorage> {
    let config = AuthConfig {
        api_base_url: Some(base_url.to_string()),
        request_timeout_secs: 5,
        ..Default::default()
    };
    let storage = Arc::new(MemoryStorage::new());
    let store: Arc<dyn CredentialStore> =
        Arc::new(BlobCredentialStore::new(storage.clone(), "client-admin"));
    let tokens = Arc::new(TokenService::new(&TokenConfig::default()).unwrap());
    let authenticator = build_authenticator(&config, store.clone(), tokens).unwrap();
    assert_eq!(authenticator.mode(), AuthMode::Remote);

    SessionManager::new(storage, store, authenticator)
}

#[tokio::test]
async fn guidance_staff_logs_in_remotely() {
    let server = spawn_server().await;
    let counselor = Identity::new("Gia", "gia@school.edu", "Passw0rd!", Role::Guidance).unwrap();
    server.state.store.insert(counselor.clone()).await.unwrap();

    let session = client_session(&server.address);
    session.init().await.unwrap();

    let identity = session.login("gia@school.edu", "Passw0rd!").await.unwrap();
    assert_eq!(identity.id, counselor.id);
    // The backend says "staff"; the client treats it as guidance
    assert_eq!(identity.role, Role::Guidance);
    assert_eq!(session.state().await, SessionState::LoggedIn);
    assert!(session.can_access_full_dashboard().await);

    // The adopted token is the backend's own
    let token = session.token().await.unwrap();
    let claims = server.state.tokens.verify(&token).unwrap();
    assert_eq!(claims.id, counselor.id);
}

#[tokio::test]
async fn remote_rejection_is_invalid_credentials() {
    let server = spawn_server().await;
    let session = client_session(&server.address);

    let err = session.login(ADMIN_EMAIL, "wrong-password").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(session.state().await, SessionState::LoggedOut);

    let admin = session.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert_eq!(admin.role, Role::Admin);
}

#[tokio::test]
async fn remote_login_never_consults_the_local_store() {
    let server = spawn_server().await;
    let session = client_session(&server.address);
    // Seeds the client-side admin with a password the backend does not know
    session.init().await.unwrap();

    let err = session.login(ADMIN_EMAIL, "client-admin").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}
