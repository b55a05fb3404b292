use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ecom_core::auth::AuthError;
use ecom_core::error::CoreError;
use ecom_core::validation::field_messages;
use serde_json::json;
use validator::ValidationErrors;

/// Message returned for every sanitized 500.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`AuthError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A generic domain error from `ecom_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A session lifecycle failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Request body failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(CoreError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }

            // --- Session lifecycle ---
            AppError::Auth(err) => classify_auth_error(err),

            // --- Field validation ---
            AppError::Validation(errors) => {
                let body = json!({
                    "error": "Request validation failed",
                    "code": "VALIDATION_ERROR",
                    "details": field_messages(errors),
                });
                return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify an [`AuthError`] into an HTTP status, error code, and message.
///
/// - Credential and token failures map to 401.
/// - A duplicate signup maps to 409.
/// - Infrastructure failures map to 500; their detail is logged, not returned.
fn classify_auth_error(err: &AuthError) -> (StatusCode, &'static str, String) {
    match err {
        AuthError::AuthenticationFailed
        | AuthError::InvalidToken
        | AuthError::TokenRevoked
        | AuthError::UnknownToken
        | AuthError::MissingRefreshToken => {
            (StatusCode::UNAUTHORIZED, err.code(), err.to_string())
        }
        AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, err.code(), err.to_string()),
        AuthError::LogoutFailed => {
            tracing::error!(error = %err, "Logout failed at the identity provider");
            (StatusCode::INTERNAL_SERVER_ERROR, err.code(), err.to_string())
        }
        AuthError::PersistenceFailed(_)
        | AuthError::ProviderUnavailable(_)
        | AuthError::AccountCreationFailed(_) => {
            tracing::error!(error = %err, code = err.code(), "Auth infrastructure error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.code(),
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
