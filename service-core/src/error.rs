use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    /// An extractor refused the request; carries its status and text.
    #[error("Request rejected ({0}): {1}")]
    Rejected(StatusCode, String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    /// The service is up but a dependency it needs is not available yet.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Raw driver failure, raised by storage code.
    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    /// A storage failure surfaced to the caller. The first field is the
    /// public message; the cause is only logged.
    #[error("{0}: {1}")]
    StorageError(&'static str, anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Re-wrap a storage failure with the message the client should see.
    pub fn storage(public_message: &'static str, err: AppError) -> Self {
        match err {
            AppError::ServiceUnavailable(_) | AppError::StorageError(..) => err,
            other => AppError::StorageError(public_message, anyhow::Error::new(other)),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected(rejection.status(), rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::Rejected(status, msg) => (status, msg, None),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Unhandled internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error reached the response boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::StorageError(msg, err) => {
                tracing::error!(error = %err, "{}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string(), None)
            }
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
