//! HTTP mapping of auth errors

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ireport_auth::AuthError;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by every handler and extractor; renders `{error, message}`
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            AuthError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Storage(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.0.is_server_fault() {
            if let AuthError::Storage(inner) = &self.0 {
                inner.log();
            } else {
                error!("Request failed: {}", self.0);
            }
        } else if status == StatusCode::SERVICE_UNAVAILABLE {
            warn!("Request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.kind(),
            "message": self.0.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Malformed JSON bodies become `validation_failed` instead of axum's plain-text rejection
pub fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError(AuthError::Validation(rejection.body_text()))
}
