/// Error types for socially-service
///
/// Every handler returns [`Result`]; [`AppError`] renders the
/// `{"error": ..., "status": ...}` body. Store failures are logged here and
/// reach the client only as a static 500 message.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for socially-service operations
pub type Result<T> = std::result::Result<T, AppError>;

const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid input
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid session
    #[error("{0}")]
    Unauthorized(String),

    /// Caller does not own the resource
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Anything else unexpected
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized".to_string())
    }

    /// Message safe to show to clients
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

impl AppError {
    /// `{"error", "status"}` body, for handlers that extend it
    pub fn body(&self) -> serde_json::Value {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed with internal error");
        }

        serde_json::json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        })
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}
