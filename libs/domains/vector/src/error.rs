use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Collection already exists: {0}")]
    AlreadyExists(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Non-success HTTP status from an upstream service
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl VectorError {
    /// Connection failures, 429 and 5xx are worth retrying; everything else
    /// fails the same way on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            VectorError::Connection(_) => true,
            VectorError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for VectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VectorError::Internal(format!("Malformed upstream response: {}", err))
        } else {
            VectorError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert VectorError to AppError for standardized HTTP error responses.
///
/// Upstream details are logged where the error is raised; clients only see a
/// generic message.
impl From<VectorError> for AppError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Validation(msg) => AppError::BadRequest(msg),
            VectorError::Embedding(_) => {
                AppError::upstream(ErrorCode::EmbeddingFailed, "Failed to embed the query")
            }
            VectorError::Search(_) => {
                AppError::upstream(ErrorCode::SearchFailed, "Vector search failed")
            }
            VectorError::IndexUnavailable(_)
            | VectorError::Connection(_)
            | VectorError::Upstream { .. } => {
                AppError::upstream(ErrorCode::IndexUnavailable, "Vector index is unavailable")
            }
            VectorError::AlreadyExists(name) => {
                AppError::Conflict(format!("Collection {} already exists", name))
            }
            VectorError::CollectionNotFound(name) => {
                AppError::NotFound(format!("Collection {} not found", name))
            }
            VectorError::Config(_) | VectorError::Internal(_) => {
                AppError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for VectorError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
