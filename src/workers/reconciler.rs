use chrono::Utc;
use cron::Schedule;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::modules::upload::model::{JobStatus, JobUpdate};
use crate::modules::upload::repository::StoreError;
use crate::modules::upload::service::UploadService;

pub const TIMED_OUT_REASON: &str = "processing timed out";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub timed_out: usize,
    pub redispatched: usize,
}

/// Recovers jobs that stopped moving: processing jobs whose worker went quiet
/// and uploaded jobs whose task never reached a worker.
pub struct Reconciler {
    uploads: UploadService,
    stale_processing_after: Duration,
    requeue_uploaded_after: Duration,
}

impl Reconciler {
    pub fn new(
        uploads: UploadService,
        stale_processing_after: Duration,
        requeue_uploaded_after: Duration,
    ) -> Self {
        Self {
            uploads,
            stale_processing_after,
            requeue_uploaded_after,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let jobs = self.uploads.jobs();
        let now = OffsetDateTime::now_utc();
        let mut report = SweepReport::default();

        let stale = jobs
            .list_stale(JobStatus::Processing, now - self.stale_processing_after)
            .await?;
        for job in stale {
            match jobs
                .transition(
                    job.id,
                    JobStatus::Processing,
                    JobStatus::Failed,
                    JobUpdate::failed(TIMED_OUT_REASON),
                )
                .await
            {
                Ok(_) => {
                    warn!(job_id = %job.id, "Processing timed out, job marked failed");
                    report.timed_out += 1;
                }
                // The worker reported in after the listing.
                Err(StoreError::Conflict { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let waiting = jobs
            .list_stale(JobStatus::Uploaded, now - self.requeue_uploaded_after)
            .await?;
        for job in waiting {
            match self.uploads.redispatch(&job).await {
                Ok(Some(queue_task_id)) => {
                    info!(job_id = %job.id, queue_task_id = %queue_task_id, "Re-dispatched uploaded job");
                    report.redispatched += 1;
                }
                // Claimed by a worker or another sweep since the listing.
                Ok(None) => {}
                Err(e) => warn!(job_id = %job.id, "Failed to re-dispatch uploaded job: {}", e),
            }
        }

        Ok(report)
    }
}

/// Runs `sweep` at every upcoming time of `schedule`.
pub async fn start_reconciler(reconciler: Reconciler, schedule: Schedule) {
    info!("🧹 Reconciliation sweep scheduled");

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            warn!("Reconciliation schedule has no upcoming runs, stopping sweep");
            return;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match reconciler.sweep().await {
            Ok(report) if report == SweepReport::default() => {}
            Ok(report) => info!(
                timed_out = report.timed_out,
                redispatched = report.redispatched,
                "Reconciliation sweep finished"
            ),
            Err(e) => error!("Reconciliation sweep failed: {}", e),
        }
    }
}
