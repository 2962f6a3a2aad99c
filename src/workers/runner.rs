use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use super::processor::{MediaProcessor, ProgressReporter};
use crate::infrastructure::storage::ObjectStore;
use crate::modules::catalog::repository::{CatalogError, CatalogStore};
use crate::modules::upload::events::ProcessingTask;
use crate::modules::upload::model::{JobStatus, JobUpdate};
use crate::modules::upload::repository::{StoreError, UploadJobStore};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed { processed_url: String },
    Failed { reason: String },
    /// Nothing to do for this delivery: the job is decided, unknown, or
    /// owned by another delivery.
    Skipped,
}

#[derive(Debug, Error)]
pub enum RunError {
    /// The job store could not be reached; the delivery should be retried.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The job completed but its catalog record was not updated; a
    /// redelivery re-applies the write.
    #[error("job completed but catalog write failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Applies the processing contract to one delivered task.
pub struct JobRunner {
    jobs: Arc<dyn UploadJobStore>,
    catalog: Arc<dyn CatalogStore>,
    objects: Arc<dyn ObjectStore>,
    processor: Arc<dyn MediaProcessor>,
    /// How long a `processing` job must be silent before a delivery may take
    /// it over from the worker that claimed it.
    resume_after: Duration,
}

impl JobRunner {
    pub fn new(
        jobs: Arc<dyn UploadJobStore>,
        catalog: Arc<dyn CatalogStore>,
        objects: Arc<dyn ObjectStore>,
        processor: Arc<dyn MediaProcessor>,
        resume_after: Duration,
    ) -> Self {
        Self {
            jobs,
            catalog,
            objects,
            processor,
            resume_after,
        }
    }

    pub async fn handle(&self, task: &ProcessingTask) -> Result<RunOutcome, RunError> {
        let job_id = task.job_id();

        let job = match self.jobs.get(job_id).await {
            Ok(job) => job,
            Err(StoreError::NotFound(_)) => {
                warn!(job_id = %job_id, "Task for unknown job, dropping");
                return Ok(RunOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        match job.status {
            JobStatus::Completed => {
                // The first delivery may have completed the job and then lost
                // the catalog write. Writing the same URL again is harmless.
                if let Some(processed_url) = job.processed_url.as_deref() {
                    self.publish(task, processed_url).await?;
                }
                info!(job_id = %job_id, "Job already completed, catalog confirmed");
                return Ok(RunOutcome::Skipped);
            }
            JobStatus::Failed => {
                info!(job_id = %job_id, "Job already failed, ignoring redelivery");
                return Ok(RunOutcome::Skipped);
            }
            JobStatus::Pending => {
                warn!(job_id = %job_id, "Task for a job that was never confirmed, dropping");
                return Ok(RunOutcome::Skipped);
            }
            JobStatus::Uploaded => {
                match self
                    .jobs
                    .transition(job_id, JobStatus::Uploaded, JobStatus::Processing, JobUpdate::default())
                    .await
                {
                    Ok(_) => info!(job_id = %job_id, kind = %task.kind(), "🎬 Claimed job"),
                    Err(StoreError::Conflict { current, .. }) => {
                        info!(job_id = %job_id, status = %current, "Job claimed by another delivery");
                        return Ok(RunOutcome::Skipped);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            JobStatus::Processing => {
                let silent_for = OffsetDateTime::now_utc() - job.updated_at;
                if silent_for < self.resume_after {
                    info!(job_id = %job_id, "Job is being processed by another delivery");
                    return Ok(RunOutcome::Skipped);
                }
                // The claiming worker went quiet; take the job over.
                warn!(job_id = %job_id, kind = %task.kind(), "Resuming job left in processing");
            }
        }

        let progress = ProgressReporter::new(self.jobs.clone(), job_id);
        match self.processor.process(task, &progress).await {
            Ok(processed_url) => self.finish(task, processed_url).await,
            Err(e) => self.fail(task, e.to_string()).await,
        }
    }

    async fn finish(&self, task: &ProcessingTask, processed_url: String) -> Result<RunOutcome, RunError> {
        let job_id = task.job_id();

        // The job transition gates the catalog write: only the delivery that
        // wins it touches the catalog.
        match self
            .jobs
            .transition(
                job_id,
                JobStatus::Processing,
                JobStatus::Completed,
                JobUpdate::completed(processed_url.clone()),
            )
            .await
        {
            Ok(_) => {}
            Err(StoreError::Conflict { current, .. }) => {
                warn!(job_id = %job_id, status = %current, "Job decided elsewhere, discarding result");
                return Ok(RunOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        }

        self.publish(task, &processed_url).await?;
        info!(job_id = %job_id, target = %task.catalog_target(), "✅ Job completed");

        Ok(RunOutcome::Completed { processed_url })
    }

    /// Points the catalog at the processed media, then drops a replaced
    /// avatar object. Safe to repeat for the same URL.
    async fn publish(&self, task: &ProcessingTask, processed_url: &str) -> Result<(), RunError> {
        let job_id = task.job_id();
        let target = task.catalog_target();

        if let Err(e) = self.catalog.apply_processed(target, processed_url).await {
            error!(job_id = %job_id, target = %target, "Catalog write failed: {}", e);
            return Err(e.into());
        }

        if let ProcessingTask::Avatar(avatar) = task {
            if let Some(previous) = avatar
                .previous_avatar_url
                .as_deref()
                .filter(|previous| *previous != processed_url)
            {
                if let Err(e) = self.objects.delete_object(previous).await {
                    warn!(job_id = %job_id, "Failed to delete previous avatar {}: {}", previous, e);
                }
            }
        }

        Ok(())
    }

    async fn fail(&self, task: &ProcessingTask, reason: String) -> Result<RunOutcome, RunError> {
        let job_id = task.job_id();
        let update = JobUpdate::failed(reason);
        let reason = update.error_message.clone().unwrap_or_default();

        match self
            .jobs
            .transition(job_id, JobStatus::Processing, JobStatus::Failed, update)
            .await
        {
            Ok(_) => {
                error!(job_id = %job_id, "❌ Job failed: {}", reason);
                Ok(RunOutcome::Failed { reason })
            }
            Err(StoreError::Conflict { current, .. }) => {
                warn!(job_id = %job_id, status = %current, "Job decided elsewhere, discarding failure");
                Ok(RunOutcome::Skipped)
            }
            Err(e) => Err(e.into()),
        }
    }
}
