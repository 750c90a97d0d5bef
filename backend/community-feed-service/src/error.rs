/// Error types for community-feed-service
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::repository::{CounterError, LedgerError, StoreError};

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Bad input, rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The ledger mutation itself could not be performed
    #[error("Toggle failed: {0}")]
    ToggleFailed(String),

    /// Post/feed reads failed; no partial result is returned
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Wrap a read-side failure so callers never see a partial result.
    pub fn fetch(err: impl std::fmt::Display) -> Self {
        ServiceError::FetchFailed(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<CounterError> for ServiceError {
    fn from(err: CounterError) -> Self {
        match err {
            CounterError::MissingPost(post_id) => {
                ServiceError::NotFound(format!("post {}", post_id))
            }
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownPost(post_id) => {
                ServiceError::NotFound(format!("post {}", post_id))
            }
            other => ServiceError::ToggleFailed(other.to_string()),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ToggleFailed(_) | ServiceError::FetchFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServiceError::Storage(_) | ServiceError::Config(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
