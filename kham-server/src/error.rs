//! API error type rendered as `{ "error": message }` JSON.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kham_core::ValidationError;
use thiserror::Error;

use crate::metrics;
use crate::store::StoreError;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Bad request that is not a field validation failure.
    #[error("{0}")]
    BadRequest(String),
    /// No bearer token on a protected route.
    #[error("Access token required")]
    MissingToken,
    /// Unknown or expired bearer token.
    #[error("Invalid or expired token")]
    InvalidToken,
    /// Record absent.
    #[error("{0}")]
    NotFound(String),
    /// Record already exists.
    #[error("{0}")]
    Conflict(String),
    /// Anything else; details are logged, not returned.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(_) => Self::Conflict("Username already exists".to_string()),
            StoreError::UserNotFound(_) => Self::NotFound("User not found".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Validation(err) => {
                tracing::debug!(error = %err, "Validation failed");
                metrics::record_validation_failure(validation_kind(err));
            }
            Self::MissingToken => metrics::record_auth_failure("missing_token"),
            Self::InvalidToken => metrics::record_auth_failure("invalid_token"),
            Self::Internal(detail) => tracing::error!(%detail, "Request failed"),
            _ => {}
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

fn validation_kind(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::MissingCredentials
        | ValidationError::UsernameTooShort
        | ValidationError::UsernameTooLong
        | ValidationError::UsernameInvalidChars => "username",
        ValidationError::PasswordTooLong | ValidationError::PasswordMismatch => "password",
        ValidationError::DisplayNameMissing | ValidationError::DisplayNameTooLong => {
            "display_name"
        }
        ValidationError::CharacterMissing | ValidationError::CharacterInvalid => "character",
        ValidationError::InvalidPeriod(_) => "period",
        ValidationError::InvalidLimit => "limit",
    }
}
