//! Shared error handling for API endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error type with automatic response conversion.
///
/// Each variant carries the human-readable detail; the machine-readable
/// `error` label and status are fixed per variant, so clients can branch on
/// the label without parsing the message.
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    InvalidToken(String),
    SessionExpired(String),
    Forbidden(String),
    ForbiddenSuperAdmin(String),
    AccountRestricted(String),
    SessionNotFound(String),
    UserNotFound(String),
    TooManyRequests(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn session_expired(msg: impl Into<String>) -> Self {
        Self::SessionExpired(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn forbidden_super_admin(msg: impl Into<String>) -> Self {
        Self::ForbiddenSuperAdmin(msg.into())
    }

    pub fn account_restricted(msg: impl Into<String>) -> Self {
        Self::AccountRestricted(msg.into())
    }

    pub fn session_not_found(msg: impl Into<String>) -> Self {
        Self::SessionNotFound(msg.into())
    }

    pub fn user_not_found(msg: impl Into<String>) -> Self {
        Self::UserNotFound(msg.into())
    }

    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::TooManyRequests(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Log the real cause server-side; clients only ever see the generic 500.
    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal("An unexpected error occurred".into())
    }

    pub fn signing_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal("An unexpected error occurred".into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg),
            ApiError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, "Invalid Token", msg),
            ApiError::SessionExpired(msg) => (StatusCode::UNAUTHORIZED, "Session Expired", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", msg),
            ApiError::ForbiddenSuperAdmin(msg) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN_SUPERADMIN", msg)
            }
            ApiError::AccountRestricted(msg) => (StatusCode::FORBIDDEN, "Account Restricted", msg),
            ApiError::SessionNotFound(msg) => (StatusCode::NOT_FOUND, "Session Not Found", msg),
            ApiError::UserNotFound(msg) => (StatusCode::NOT_FOUND, "User Not Found", msg),
            ApiError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests", msg)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", msg)
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: label,
                message,
            }),
        )
            .into_response()
    }
}
