//! HTTP error mapping. Every failure leaves the service as
//! `{"error": message, "code": CODE}` with a matching status.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sourcelab_core::error::CoreError;
use sqlx::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed request that is not a field validation failure, such as
    /// a multipart body with no file.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// 500 with a message that leaks nothing about the cause.
fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl AppError {
    /// Status, machine-readable code and client-facing message. Causes of
    /// 500s are logged here and replaced with a generic message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} '{id}' not found"),
            ),
            Self::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            Self::Core(CoreError::Conflict(msg)) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            Self::Core(CoreError::Internal(msg)) | Self::InternalError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                internal()
            }
            Self::Database(err) => database_parts(err),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            Self::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
        }
    }
}

/// Constraint violations are caller errors: a duplicate key is 409 and a
/// dangling `document_id` is 404. Anything else is a 500.
fn database_parts(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    if let sqlx::Error::RowNotFound = err {
        return (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        );
    }
    if let sqlx::Error::Database(db_err) = err {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "A record with this key already exists".to_string(),
                )
            }
            ErrorKind::ForeignKeyViolation => {
                return (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Referenced document not found".to_string(),
                )
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database query failed");
    internal()
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(err.body_text()),
            _ => Self::BadRequest(err.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.parts();
        (status, Json(ErrorBody { error, code })).into_response()
    }
}
