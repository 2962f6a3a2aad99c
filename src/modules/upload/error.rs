use axum::http::StatusCode;
use thiserror::Error;

use super::events::TaskError;
use super::queue::QueueError;
use super::repository::StoreError;
use crate::common::response::ApiError;
use crate::modules::catalog::repository::CatalogError;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload job not found")]
    NotFound,

    #[error("Forbidden: not the owner of this upload")]
    Forbidden,

    #[error("Uploaded file URL does not match the issued upload URL")]
    UrlMismatch,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Retryable: the job store could not be reached or timed out.
    #[error("Job store unavailable: {0}")]
    StoreUnavailable(String),

    /// Retryable: the job is recorded as uploaded and will be re-dispatched.
    #[error("Job queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::NotFound => StatusCode::NOT_FOUND,
            UploadError::Forbidden => StatusCode::FORBIDDEN,
            UploadError::UrlMismatch | UploadError::Validation(_) => StatusCode::BAD_REQUEST,
            UploadError::StoreUnavailable(_)
            | UploadError::QueueUnavailable(_)
            | UploadError::StorageUnavailable(_)
            | UploadError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for UploadError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => UploadError::NotFound,
            other => UploadError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<QueueError> for UploadError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::InvalidTask(reason) => UploadError::Validation(reason),
            other => UploadError::QueueUnavailable(other.to_string()),
        }
    }
}

impl From<TaskError> for UploadError {
    fn from(e: TaskError) -> Self {
        UploadError::Validation(e.to_string())
    }
}

impl From<CatalogError> for UploadError {
    fn from(e: CatalogError) -> Self {
        UploadError::CatalogUnavailable(e.to_string())
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        ApiError(e.to_string(), e.status_code())
    }
}
