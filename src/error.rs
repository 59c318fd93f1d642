//! Error taxonomy shared by the engine, the WebSocket protocol, and the
//! REST surface.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationError;

use crate::state::machine::InvalidTransition;
use crate::state::session::{InvalidSessionCode, SubmitError};

/// Engine-level rejections. Every variant leaves session state untouched
/// and is local to the command that triggered it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input (bad code format, missing or empty fields).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A non-host issued a host-only command.
    #[error("no permission: {0}")]
    NoPermission(String),
    /// Command cannot be applied in the session's current phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Unknown session code on a non-join command.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Machine-readable kind carried in the `error` event's `code` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) => "invalidInput",
            ServiceError::NoPermission(_) => "noPermission",
            ServiceError::InvalidState(_) => "invalidState",
            ServiceError::NotFound(_) => "notFound",
        }
    }
}

impl From<InvalidSessionCode> for ServiceError {
    fn from(err: InvalidSessionCode) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<SubmitError> for ServiceError {
    fn from(err: SubmitError) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NoPermission(message) => AppError::Unauthorized(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
