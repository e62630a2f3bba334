//! HTTP handlers

pub mod auth;
pub mod health;
pub mod users;

pub use auth::*;
pub use health::*;
pub use users::*;

use crate::error::ApiError;
use ireport_auth::AuthError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError(AuthError::NotFound("route".to_string()))
}
