use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::model::{FileKind, JobStatus, UploadJob};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestUploadRequest {
    pub kind: FileKind,
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: String,
    #[validate(range(min = 1, message = "File size must be positive"))]
    pub file_size: i64,
    #[validate(length(min = 1, message = "Content type is required"))]
    pub content_type: String,
    pub content_id: Option<Uuid>,
    pub episode_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSlotResponse {
    pub job_id: Uuid,
    /// Pre-signed PUT URL the client uploads the bytes to.
    pub upload_url: String,
    /// Object location to report back on completion.
    pub file_url: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub job_id: Uuid,
    pub file_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadResponse {
    pub job_id: Uuid,
    pub queue_task_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadJobResponse {
    pub job_id: Uuid,
    pub kind: FileKind,
    pub file_name: String,
    pub file_size: i64,
    pub content_id: Option<Uuid>,
    pub episode_id: Option<Uuid>,
    pub status: JobStatus,
    pub progress: i32,
    pub processed_url: Option<String>,
    pub error_message: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
}

impl From<UploadJob> for UploadJobResponse {
    fn from(job: UploadJob) -> Self {
        Self {
            job_id: job.id,
            kind: job.kind,
            file_name: job.file_name,
            file_size: job.file_size,
            content_id: job.content_id,
            episode_id: job.episode_id,
            status: job.status,
            progress: job.progress,
            processed_url: job.processed_url,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
