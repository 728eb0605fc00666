use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::storage::UploadError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailure(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UploadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UploadFailure(_) => "UPLOAD_FAILED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg) => {
                tracing::warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::UploadFailure(msg) | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => {
                AppError::NotFound(format!("Event with id '{}' was not found", id))
            }
            StoreError::Database(e) => AppError::DatabaseError(e),
            StoreError::Migration(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::UploadFailure(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Client errors carry their own message; server errors get a generic
        // message and the underlying reason for diagnostics only.
        let (public_message, details) = match &self {
            AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg) => (msg.clone(), None),
            AppError::UploadFailure(msg) => {
                ("Failed to upload image".to_string(), Some(json!({ "reason": msg })))
            }
            AppError::InternalServerError(msg) => {
                ("Internal Server Error".to_string(), Some(json!({ "reason": msg })))
            }
            AppError::DatabaseError(e) => (
                "A database error occurred".to_string(),
                Some(json!({ "reason": e.to_string() })),
            ),
        };

        error_response(code, public_message, details, status)
    }
}
