// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use usersvc_common::{ErrorDetail, ErrorResponse};

use crate::auth::{AuthError, SessionError};
use crate::users::UserError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Session token rejected; the cause is never exposed
    #[error("Authentication failed")]
    Unauthorized,

    #[error("Missing authentication header")]
    MissingToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User exists")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Wrong password provided")]
    PasswordMismatch,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::UserExists | AppError::PasswordMismatch | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            },
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "AUTH_001",
            AppError::MissingToken => "AUTH_002",
            AppError::PasswordMismatch => "AUTH_003",
            AppError::Forbidden(_) => "AUTH_004",
            AppError::UserExists => "USER_001",
            AppError::UserNotFound => "USER_002",
            AppError::Validation(_) => "VAL_001",
            AppError::BadRequest(_) => "REQ_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Message sent to the client. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(_: AuthError) -> Self {
        AppError::Unauthorized
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::AlreadyExists => AppError::UserExists,
            UserError::NotFound => AppError::UserNotFound,
            UserError::PasswordMismatch => AppError::PasswordMismatch,
            UserError::Hashing(e) => AppError::Internal(e.to_string()),
            UserError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}
