//! iReport authentication and authorization core
//!
//! The pieces, leaves first:
//! - [`store`]: credential stores holding hashed passwords and role assignments
//! - [`token`]: signed, expiring session tokens
//! - [`authenticator`]: local or remote email/password verification
//! - [`authorizer`]: role and permission checks gating every protected operation
//! - [`session`]: client-side owner of the current identity and token

pub mod authenticator;
pub mod authorizer;
pub mod config;
pub mod error;
pub mod identity;
pub mod password;
pub mod role;
pub mod session;
pub mod storage;
pub mod store;
pub mod token;
pub mod wire;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use authenticator::{
    build_authenticator, AuthMode, Authenticated, Authenticator, LocalAuthenticator,
    RemoteAuthenticator,
};
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use identity::{Identity, IdentityInfo, ProfileUpdate, DEFAULT_ADMIN_ID};
pub use role::{AccountClass, Permission, Role};
pub use session::{SessionManager, SessionState};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{BlobCredentialStore, CredentialStore};
pub use token::{SessionClaims, TokenConfig, TokenService, DEFAULT_SECRET};

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteCredentialStore;
