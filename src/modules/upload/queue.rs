use async_trait::async_trait;
use lapin::BasicProperties;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::events::ProcessingTask;
use super::model::FileKind;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;

pub const VIDEO_QUEUE: &str = "video_processing";
pub const AVATAR_QUEUE: &str = "avatar_processing";
pub const POSTER_QUEUE: &str = "poster_processing";

pub fn queue_name(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Video => VIDEO_QUEUE,
        FileKind::Avatar => AVATAR_QUEUE,
        FileKind::Poster => POSTER_QUEUE,
    }
}

/// Broker failures are kept apart from bad tasks so the orchestrator can tell
/// "bad request" from "infrastructure unavailable".
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("broker unavailable: {0}")]
    Broker(String),

    #[error("broker did not confirm in time")]
    Timeout,
}

/// At-least-once publication of processing tasks. Returns the correlation id
/// carried by the published message.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, task: &ProcessingTask) -> Result<String, QueueError>;
}

pub struct RabbitJobQueue {
    rabbit: RabbitMqService,
}

impl RabbitJobQueue {
    pub fn new(rabbit: RabbitMqService) -> Self {
        Self { rabbit }
    }
}

#[async_trait]
impl JobQueue for RabbitJobQueue {
    async fn enqueue(&self, task: &ProcessingTask) -> Result<String, QueueError> {
        if task.source_url().trim().is_empty() {
            return Err(QueueError::InvalidTask(format!(
                "job {} has no source object",
                task.job_id()
            )));
        }

        let payload =
            serde_json::to_vec(task).map_err(|e| QueueError::InvalidTask(e.to_string()))?;

        let task_id = Uuid::new_v4().to_string();
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_message_id(task_id.clone().into())
            .with_correlation_id(task_id.clone().into());

        let queue = queue_name(task.kind());
        self.rabbit
            .publish(queue, &payload, properties)
            .await
            .map_err(|e| QueueError::Broker(e.to_string()))?;

        info!(job_id = %task.job_id(), queue, task_id = %task_id, "Processing task published");
        Ok(task_id)
    }
}
