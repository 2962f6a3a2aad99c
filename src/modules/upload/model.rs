use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "upload_job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Forward edges of the job lifecycle. Terminal states have none.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Uploaded)
                | (JobStatus::Uploaded, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Uploaded => "uploaded",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "upload_file_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Video,
    Avatar,
    Poster,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Video => "video",
            FileKind::Avatar => "avatar",
            FileKind::Poster => "poster",
        }
    }

    /// Top-level MIME type accepted for this kind of upload.
    pub fn accepted_mime_type(self) -> mime::Name<'static> {
        match self {
            FileKind::Video => mime::VIDEO,
            FileKind::Avatar | FileKind::Poster => mime::IMAGE,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, ToSchema)]
pub struct UploadJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: Option<Uuid>,
    pub episode_id: Option<Uuid>,
    pub kind: FileKind,
    pub file_name: String,
    pub file_size: i64,
    pub upload_url: String,
    pub processed_url: Option<String>,
    pub status: JobStatus,
    pub progress: i32,
    pub error_message: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields needed to register a new job in `pending`.
#[derive(Debug, Clone)]
pub struct NewUploadJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: Option<Uuid>,
    pub episode_id: Option<Uuid>,
    pub kind: FileKind,
    pub file_name: String,
    pub file_size: i64,
    pub upload_url: String,
}

/// Optional columns written together with a status transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub processed_url: Option<String>,
    pub progress: Option<i32>,
    pub error_message: Option<String>,
}

const DEFAULT_FAILURE_REASON: &str = "processing failed";

impl JobUpdate {
    pub fn completed(processed_url: impl Into<String>) -> Self {
        Self {
            processed_url: Some(processed_url.into()),
            progress: Some(100),
            error_message: None,
        }
    }

    /// A failed job always carries a non-empty reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            DEFAULT_FAILURE_REASON.to_string()
        } else {
            reason
        };

        Self {
            processed_url: None,
            progress: None,
            error_message: Some(reason),
        }
    }
}

/// The identity acting on a job, taken from the verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: Uuid) -> Self {
        Self { user_id, is_admin: false }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, is_admin: true }
    }

    pub fn may_act_on(&self, job: &UploadJob) -> bool {
        self.is_admin || job.user_id == self.user_id
    }
}
