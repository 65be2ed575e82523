//! Unified application error model and mapping helpers.
//! Every failure that can reach a caller is one of these kinds; storage and token
//! errors are translated into it at the service boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::decode::Violations;
use crate::identity::TokenError;
use crate::model::UpdateError;
use crate::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    ValidationInvalid { message: String },
    AuthorizationInvalid { message: String },
    SecretNotConfigured { message: String },
    SecretAlreadySet { message: String },
    NotFound { message: String },
    AlreadyExists { message: String },
    PasswordInvalid { message: String },
    UpdateConflict { message: String },
    IdentityMismatch { message: String },
    Internal { message: String },
}

impl AppError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::ValidationInvalid { .. } => "validation_invalid",
            AppError::AuthorizationInvalid { .. } => "authorization_invalid",
            AppError::SecretNotConfigured { .. } => "secret_not_configured",
            AppError::SecretAlreadySet { .. } => "secret_already_set",
            AppError::NotFound { .. } => "not_found",
            AppError::AlreadyExists { .. } => "already_exists",
            AppError::PasswordInvalid { .. } => "password_invalid",
            AppError::UpdateConflict { .. } => "update_conflict",
            AppError::IdentityMismatch { .. } => "identity_mismatch",
            AppError::Internal { .. } => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::ValidationInvalid { message }
            | AppError::AuthorizationInvalid { message }
            | AppError::SecretNotConfigured { message }
            | AppError::SecretAlreadySet { message }
            | AppError::NotFound { message }
            | AppError::AlreadyExists { message }
            | AppError::PasswordInvalid { message }
            | AppError::UpdateConflict { message }
            | AppError::IdentityMismatch { message }
            | AppError::Internal { message } => message.as_str(),
        }
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self { AppError::ValidationInvalid { message: msg.into() } }
    pub fn authorization() -> Self { AppError::AuthorizationInvalid { message: "invalid authorization".into() } }
    pub fn not_found() -> Self { AppError::NotFound { message: "not found".into() } }
    pub fn already_exists() -> Self { AppError::AlreadyExists { message: "already exists".into() } }
    pub fn password_invalid() -> Self { AppError::PasswordInvalid { message: "invalid password".into() } }
    pub fn update_conflict() -> Self { AppError::UpdateConflict { message: "update is not newer than stored data".into() } }
    pub fn identity_mismatch() -> Self { AppError::IdentityMismatch { message: "different ids".into() } }
    pub fn internal() -> Self { AppError::Internal { message: "internal error".into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::ValidationInvalid { .. } => 400,
            AppError::AuthorizationInvalid { .. } => 401,
            AppError::PasswordInvalid { .. } => 401,
            AppError::NotFound { .. } => 404,
            AppError::AlreadyExists { .. } => 409,
            AppError::UpdateConflict { .. } => 409,
            AppError::IdentityMismatch { .. } => 409,
            AppError::SecretNotConfigured { .. }
            | AppError::SecretAlreadySet { .. }
            | AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

/// Wire shape of an error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        ErrorBody { code: err.code_str().to_string(), message: err.message().to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

impl From<Violations> for AppError {
    fn from(v: Violations) -> Self { AppError::validation(v.to_string()) }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { .. } => AppError::already_exists(),
            StorageError::NotFound => AppError::not_found(),
            StorageError::Conflict => AppError::update_conflict(),
            StorageError::Internal(msg) => {
                // raw storage text stays in the log
                tracing::error!(target: "storage", "storage failure: {}", msg);
                AppError::internal()
            }
        }
    }
}

impl From<UpdateError> for AppError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::IdentityMismatch { .. } => AppError::identity_mismatch(),
            UpdateError::NotNewer { .. } => AppError::update_conflict(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::SecretNotConfigured => AppError::SecretNotConfigured { message: err.to_string() },
            TokenError::SecretAlreadySet => AppError::SecretAlreadySet { message: err.to_string() },
            other => {
                tracing::error!(target: "identity", "token failure: {}", other);
                AppError::internal()
            }
        }
    }
}
