//! Request and response bodies shared by the HTTP API and the remote authenticator

use crate::identity::Identity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Minimal user projection returned by `/api/auth/login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireUser {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Backend vocabulary: `admin`, `teacher`, `student` or `staff`
    pub role: String,
}

impl From<&Identity> for WireUser {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            role: identity.role.backend_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub user: WireUser,
    pub token: String,
}
