//! Bearer-token extractors and role gates

use crate::{error::ApiError, AppState};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use ireport_auth::{authorizer, AuthError, Identity, Role, SessionClaims};
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Caller proven by a valid bearer token, with its current stored record.
///
/// Rejects with `not_authenticated` when the header is missing and
/// `invalid_token` when the token fails verification or names an identity
/// that no longer exists or was deactivated.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: SessionClaims,
    pub identity: Identity,
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::NotAuthenticated)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(parts)?;
        let claims = app_state.tokens.verify(token)?;

        let identity = match app_state.store.find_by_id(&claims.id).await? {
            Some(identity) if identity.is_active => identity,
            Some(_) => {
                debug!(id = %claims.id, "Token names a deactivated identity");
                return Err(AuthError::InvalidToken.into());
            }
            None => {
                debug!(id = %claims.id, "Token names an unknown identity");
                return Err(AuthError::InvalidToken.into());
            }
        };

        Ok(AuthUser { claims, identity })
    }
}

/// Allow-list of roles for a route
pub trait RoleGate: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
    const NAME: &'static str;
}

/// Administrators only
pub struct AdminOnly;

impl RoleGate for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
    const NAME: &'static str = "admin";
}

/// Roles that see the full dashboard
pub struct FullDashboard;

impl RoleGate for FullDashboard {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Guidance];
    const NAME: &'static str = "full_dashboard";
}

/// Authenticated caller whose role passes gate `G`, else 403 `not_authorized`
pub struct RequireRole<G: RoleGate>(pub AuthUser, PhantomData<G>);

impl<G: RoleGate> RequireRole<G> {
    pub fn user(&self) -> &AuthUser {
        &self.0
    }
}

impl<S, G> FromRequestParts<S> for RequireRole<G>
where
    AppState: FromRef<S>,
    S: Send + Sync,
    G: RoleGate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if let Err(e) = authorizer::require_role(user.identity.role, G::ALLOWED) {
            warn!(
                "Gate '{}' refused user '{}' with role {}",
                G::NAME,
                user.identity.id,
                user.identity.role
            );
            return Err(e.into());
        }

        Ok(RequireRole(user, PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/profile");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn missing_header_is_not_authenticated() {
        assert!(matches!(
            bearer_token(&parts(None)),
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[test]
    fn non_bearer_scheme_is_invalid() {
        assert!(matches!(
            bearer_token(&parts(Some("Basic abc"))),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Bearer "))),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let parts = parts(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn gates_list_the_expected_roles() {
        assert_eq!(AdminOnly::ALLOWED, &[Role::Admin]);
        assert!(FullDashboard::ALLOWED.contains(&Role::Guidance));
        assert!(!FullDashboard::ALLOWED.contains(&Role::Teacher));
        assert!(!FullDashboard::ALLOWED.contains(&Role::Student));
    }
}
