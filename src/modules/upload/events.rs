use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::model::{FileKind, UploadJob};
use crate::modules::catalog::repository::CatalogTarget;

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("video upload {0} has neither a content nor an episode target")]
    MissingVideoTarget(Uuid),

    #[error("poster upload {0} has no content target")]
    MissingPosterTarget(Uuid),
}

/// Message published to the processing queue for one upload job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProcessingTask {
    Video(VideoTask),
    Avatar(AvatarTask),
    Poster(PosterTask),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoTask {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub source_url: String,
    pub target: VideoTarget,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VideoTarget {
    Content { content_id: Uuid },
    Episode { episode_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvatarTask {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub source_url: String,
    /// Deleted by the worker once the new avatar is in place.
    pub previous_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PosterTask {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub source_url: String,
    pub content_id: Uuid,
}

impl ProcessingTask {
    /// Builds the kind-specific payload for a job. An episode target wins over
    /// a content target for video uploads.
    pub fn from_job(job: &UploadJob, previous_avatar_url: Option<String>) -> Result<Self, TaskError> {
        let task = match job.kind {
            FileKind::Video => {
                let target = match (job.episode_id, job.content_id) {
                    (Some(episode_id), _) => VideoTarget::Episode { episode_id },
                    (None, Some(content_id)) => VideoTarget::Content { content_id },
                    (None, None) => return Err(TaskError::MissingVideoTarget(job.id)),
                };
                ProcessingTask::Video(VideoTask {
                    job_id: job.id,
                    user_id: job.user_id,
                    source_url: job.upload_url.clone(),
                    target,
                })
            }
            FileKind::Avatar => ProcessingTask::Avatar(AvatarTask {
                job_id: job.id,
                user_id: job.user_id,
                source_url: job.upload_url.clone(),
                previous_avatar_url,
            }),
            FileKind::Poster => {
                let content_id = job
                    .content_id
                    .ok_or(TaskError::MissingPosterTarget(job.id))?;
                ProcessingTask::Poster(PosterTask {
                    job_id: job.id,
                    user_id: job.user_id,
                    source_url: job.upload_url.clone(),
                    content_id,
                })
            }
        };

        Ok(task)
    }

    pub fn job_id(&self) -> Uuid {
        match self {
            ProcessingTask::Video(t) => t.job_id,
            ProcessingTask::Avatar(t) => t.job_id,
            ProcessingTask::Poster(t) => t.job_id,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            ProcessingTask::Video(t) => t.user_id,
            ProcessingTask::Avatar(t) => t.user_id,
            ProcessingTask::Poster(t) => t.user_id,
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            ProcessingTask::Video(_) => FileKind::Video,
            ProcessingTask::Avatar(_) => FileKind::Avatar,
            ProcessingTask::Poster(_) => FileKind::Poster,
        }
    }

    pub fn source_url(&self) -> &str {
        match self {
            ProcessingTask::Video(t) => &t.source_url,
            ProcessingTask::Avatar(t) => &t.source_url,
            ProcessingTask::Poster(t) => &t.source_url,
        }
    }

    /// The catalog record that receives the processed URL.
    pub fn catalog_target(&self) -> CatalogTarget {
        match self {
            ProcessingTask::Video(t) => match t.target {
                VideoTarget::Content { content_id } => CatalogTarget::ContentVideo(content_id),
                VideoTarget::Episode { episode_id } => CatalogTarget::EpisodeVideo(episode_id),
            },
            ProcessingTask::Avatar(t) => CatalogTarget::UserAvatar(t.user_id),
            ProcessingTask::Poster(t) => CatalogTarget::ContentPoster(t.content_id),
        }
    }
}
