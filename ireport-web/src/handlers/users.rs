//! Identity administration: listing, permission grants and activation

use crate::{
    auth::{AdminOnly, AuthUser, FullDashboard, RequireRole},
    error::{json_rejection, ApiError},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Json,
};
use ireport_auth::{authorizer, AccountClass, AuthError, IdentityInfo, Permission, Role};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    /// Restrict to one role
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<IdentityInfo>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct SetPermissionsRequest {
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserUpdateResponse {
    pub message: String,
    pub user: IdentityInfo,
}

/// `GET /api/users`: staff first, then students
pub async fn list_users(
    State(state): State<AppState>,
    _caller: RequireRole<FullDashboard>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let mut identities = state.store.staff().await?;
    identities.extend(state.store.list(AccountClass::Student).await?);

    let users: Vec<IdentityInfo> = identities
        .iter()
        .filter(|identity| query.role.is_none_or(|role| identity.role == role))
        .map(|identity| identity.to_info())
        .collect();

    Ok(Json(UserListResponse {
        total: users.len(),
        users,
    }))
}

/// `PUT /api/users/{id}/permissions`
pub async fn set_permissions(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<SetPermissionsRequest>, JsonRejection>,
) -> Result<Json<UserUpdateResponse>, ApiError> {
    authorizer::require_permission(&caller.identity, Permission::ManagePermissions)?;
    let Json(request) = payload.map_err(json_rejection)?;

    let mut target = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {}", id)))?;

    target.set_permissions(request.permissions)?;
    let target = state.store.update(target).await?;
    info!(by = %caller.identity.id, target = %target.id, "Permissions updated");

    Ok(Json(UserUpdateResponse {
        message: "Permissions updated successfully".to_string(),
        user: target.to_info(),
    }))
}

/// `PUT /api/users/{id}/active`
pub async fn set_active(
    State(state): State<AppState>,
    caller: RequireRole<AdminOnly>,
    Path(id): Path<String>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<UserUpdateResponse>, ApiError> {
    let Json(request) = payload.map_err(json_rejection)?;

    if caller.user().identity.id == id && !request.is_active {
        return Err(AuthError::Validation("You cannot deactivate your own account".to_string()).into());
    }

    let mut target = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {}", id)))?;

    target.is_active = request.is_active;
    target.updated_at = chrono::Utc::now();
    let target = state.store.update(target).await?;
    info!(
        by = %caller.user().identity.id,
        target = %target.id,
        active = target.is_active,
        "Activation changed"
    );

    Ok(Json(UserUpdateResponse {
        message: if target.is_active {
            "User activated".to_string()
        } else {
            "User deactivated".to_string()
        },
        user: target.to_info(),
    }))
}
