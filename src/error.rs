// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every user-facing failure carries a French `message` the page shows as a
//! toast. Store and storage failures are never differentiated for the user:
//! the cause is logged and a generic message goes out.

use crate::services::identity::AuthError;
use crate::wizard::validation::{FieldError, ValidationErrors, FORM_ERROR_TOAST};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Generic toast for failures the user cannot act on.
pub const GENERIC_ERROR_MESSAGE: &str = "Une erreur est survenue. Veuillez réessayer.";
/// Toast shown when an enrollment submission fails at any point.
pub const SUBMISSION_ERROR_MESSAGE: &str =
    "Une erreur est survenue lors de l'inscription. Veuillez réessayer.";
/// Alert shown to signed-in users without the admin role.
pub const ADMIN_DENIED_MESSAGE: &str =
    "Accès refusé. Seuls les administrateurs peuvent accéder à cette page.";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Admin role required")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(ValidationErrors),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Enrollment submission failed: {0}")]
    Submission(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
}

impl ErrorResponse {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
            details: None,
            fields: None,
            redirect: None,
        }
    }

    fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl AppError {
    fn auth_status(err: &AuthError) -> StatusCode {
        match err {
            AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
            AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::OperationNotAllowed | AuthError::UserDisabled => StatusCode::FORBIDDEN,
            AuthError::UserNotFound | AuthError::WrongPassword => StatusCode::UNAUTHORIZED,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::NetworkRequestFailed => StatusCode::BAD_GATEWAY,
            AuthError::Unknown(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Unauthorized => {
                let mut body = ErrorResponse::new("unauthorized");
                body.redirect = Some("login.html");
                (StatusCode::UNAUTHORIZED, body)
            }
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, ErrorResponse::new("invalid_token")),
            AppError::Forbidden => {
                let mut body = ErrorResponse::new("forbidden").message(ADMIN_DENIED_MESSAGE);
                body.redirect = Some("index.html");
                (StatusCode::FORBIDDEN, body)
            }
            AppError::NotFound(msg) => {
                let mut body = ErrorResponse::new("not_found");
                body.details = Some(msg);
                (StatusCode::NOT_FOUND, body)
            }
            AppError::BadRequest(msg) => {
                let mut body = ErrorResponse::new("bad_request");
                body.details = Some(msg);
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::Validation(errors) => {
                let mut body = ErrorResponse::new("validation_failed").message(FORM_ERROR_TOAST);
                body.fields = Some(errors.into_fields());
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            AppError::Auth(err) => {
                if let AuthError::Unknown(code) = &err {
                    tracing::warn!(code = %code, "Unmapped identity provider error");
                }
                let status = Self::auth_status(&err);
                let mut body = ErrorResponse::new("auth_error").message(err.to_string());
                body.details = Some(err.code().to_string());
                (status, body)
            }
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("conflict").message(msg),
            ),
            AppError::Submission(cause) => {
                tracing::error!(error = %cause, "Enrollment submission failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("submission_failed").message(SUBMISSION_ERROR_MESSAGE),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::new("storage_error").message(GENERIC_ERROR_MESSAGE),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("database_error").message(GENERIC_ERROR_MESSAGE),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal_error").message(GENERIC_ERROR_MESSAGE),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
