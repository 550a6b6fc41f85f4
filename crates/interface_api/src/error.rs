//! API error handling
//!
//! Service operations answer with their [`ServiceResult`] envelope; the HTTP
//! status is derived from its error kind. [`ApiError`] covers failures that
//! happen outside the services.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_ledger::{ErrorKind, ServiceResult};

use crate::settings::SettingsError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Validation failed".to_string(),
                Some(errors),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Invalid(_) => ApiError::Validation(err.messages()),
            other => {
                tracing::error!(error = %other, "Settings could not be saved");
                ApiError::Internal("Settings could not be saved".to_string())
            }
        }
    }
}

/// HTTP status of a failed service result
pub fn status_for(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        Some(ErrorKind::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Conflict) => StatusCode::CONFLICT,
        Some(ErrorKind::Persistence) | None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A service result sent as JSON
#[derive(Debug)]
pub struct ApiResponse<T> {
    result: ServiceResult<T>,
    success: StatusCode,
}

impl<T> ApiResponse<T> {
    /// Answers 201 when the operation succeeded
    pub fn created(result: ServiceResult<T>) -> Self {
        Self {
            result,
            success: StatusCode::CREATED,
        }
    }
}

impl<T> From<ServiceResult<T>> for ApiResponse<T> {
    fn from(result: ServiceResult<T>) -> Self {
        Self {
            result,
            success: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.result.is_success {
            self.success
        } else {
            status_for(self.result.error_kind())
        };
        (status, Json(self.result)).into_response()
    }
}
