//! Authentication handlers: login, registration, profile and logout

use crate::{
    auth::AuthUser,
    error::{json_rejection, ApiError},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use ireport_auth::{
    wire::{LoginRequest, LoginResponse, WireUser},
    AuthError, Identity, IdentityInfo, ProfileUpdate, Role,
};
use ireport_core::{log_operation_error, log_operation_start, log_operation_success};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: IdentityInfo,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: IdentityInfo,
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation("Valid email is required".to_string()))
    }
}

fn validate_name(name: &str) -> Result<(), AuthError> {
    if name.trim().chars().count() < 2 {
        return Err(AuthError::Validation(
            "Name must be at least 2 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    let mixed = password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit());
    if !mixed {
        return Err(AuthError::Validation(
            "Password must contain uppercase, lowercase, and number".to_string(),
        ));
    }
    Ok(())
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(json_rejection)?;
    validate_email(&request.email)?;
    if request.password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()).into());
    }

    let authenticated = state
        .authenticator
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: WireUser::from(&authenticated.identity),
        token: authenticated.token,
    }))
}

/// `POST /api/auth/register`
///
/// Self-registration is open to students and teachers only; staff roles are
/// granted by an administrator.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let Json(request) = payload.map_err(json_rejection)?;
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let role = match request.role.as_deref() {
        None => Role::Student,
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|_| AuthError::Validation("Invalid role".to_string()))?,
    };
    if !(role.is_student() || role.is_teacher()) {
        return Err(AuthError::NotAuthorized(format!(
            "role '{}' cannot self-register",
            role.backend_name()
        ))
        .into());
    }

    let mut identity = Identity::new(&request.name, &request.email, &request.password, role)?;
    identity.phone = request.phone.filter(|p| !p.trim().is_empty());

    log_operation_start!("register", role = %role);
    let identity = match state.store.insert(identity).await {
        Ok(identity) => identity,
        Err(e) => {
            log_operation_error!("register", e);
            return Err(e.into());
        }
    };
    let token = state.tokens.issue(&identity)?;
    log_operation_success!("register", id = %identity.id, role = %identity.role);

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            message: "User registered successfully".to_string(),
            user: WireUser::from(&identity),
            token,
        }),
    ))
}

/// `GET /api/auth/profile`
pub async fn get_profile(user: AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        user: user.identity.to_info(),
    })
}

/// `PUT /api/auth/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let Json(update) = payload.map_err(json_rejection)?;
    if update.is_empty() {
        return Err(AuthError::Validation("No profile fields to update".to_string()).into());
    }
    if let Some(name) = &update.display_name {
        validate_name(name)?;
    }

    let mut identity = user.identity;
    identity.apply(update);
    let identity = state.store.update(identity).await?;

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully".to_string(),
        user: identity.to_info(),
    }))
}

/// `POST /api/auth/logout`
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout(user: AuthUser) -> Json<Value> {
    info!(id = %user.identity.id, "Logout");
    Json(json!({ "message": "Logged out successfully" }))
}
