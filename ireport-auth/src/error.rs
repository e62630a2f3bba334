//! Authentication and authorization errors

use ireport_core::IReportError;

pub type AuthResult<T> = Result<T, AuthError>;

/// Every failure the auth core reports.
///
/// Each variant has a stable machine-readable [`kind`](AuthError::kind); none
/// of them are retried by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email, wrong password or inactive account. Deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// Expired, forged or malformed token
    #[error("Invalid or expired token")]
    InvalidToken,
    /// Protected call without a token
    #[error("Authentication required")]
    NotAuthenticated,
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    /// Remote identity API configured but unreachable
    #[error("Identity service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] IReportError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable identifier used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidToken => "invalid_token",
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::NotAuthorized(_) => "not_authorized",
            AuthError::UpstreamUnavailable(_) => "upstream_unavailable",
            AuthError::EmailTaken => "email_taken",
            AuthError::Validation(_) => "validation_failed",
            AuthError::NotFound(_) => "not_found",
            AuthError::Storage(_) | AuthError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to a caller. Server faults never leak their details.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Storage(_) | AuthError::Internal(_) => "Internal server error".to_string(),
            AuthError::UpstreamUnavailable(_) => {
                "Identity service is unavailable, please try again later".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for unexpected faults that should surface as a 5xx
    pub fn is_server_fault(&self) -> bool {
        matches!(self, AuthError::Storage(_) | AuthError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ireport_core::storage_error;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AuthError::InvalidCredentials.kind(), "invalid_credentials");
        assert_eq!(AuthError::InvalidToken.kind(), "invalid_token");
        assert_eq!(AuthError::NotAuthenticated.kind(), "not_authenticated");
        assert_eq!(
            AuthError::NotAuthorized("x".into()).kind(),
            "not_authorized"
        );
        assert_eq!(
            AuthError::UpstreamUnavailable("down".into()).kind(),
            "upstream_unavailable"
        );
    }

    #[test]
    fn storage_errors_do_not_leak() {
        let err: AuthError = storage_error!("disk full at /var/lib/ireport", "blob_store").into();
        assert!(err.is_server_fault());
        assert_eq!(err.kind(), "internal_error");
        assert!(!err.public_message().contains("/var/lib"));
    }
}
