use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{JobStatus, JobUpdate, NewUploadJob, UploadJob};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("upload job {0} not found")]
    NotFound(Uuid),

    /// The job was not in the expected status. Callers treat this as
    /// "already handled", never as a crash.
    #[error("upload job {job_id} is {current}, expected {expected}")]
    Conflict {
        job_id: Uuid,
        expected: JobStatus,
        current: JobStatus,
    },

    #[error("job store did not respond in time")]
    Timeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable record of every upload and the only shared mutable state of the
/// pipeline. Status changes go through `transition`, never a blind overwrite.
#[async_trait]
pub trait UploadJobStore: Send + Sync {
    async fn create(&self, job: NewUploadJob) -> Result<UploadJob, StoreError>;

    async fn get(&self, job_id: Uuid) -> Result<UploadJob, StoreError>;

    /// Compare-and-set on `status`: applies `to` and `update` only if the
    /// stored status equals `from` and the edge is a forward one.
    async fn transition(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
        update: JobUpdate,
    ) -> Result<UploadJob, StoreError>;

    /// Records progress while the job is `processing`. Returns `false` when the
    /// report was ignored (job not processing, or progress would go backwards).
    async fn set_progress(&self, job_id: Uuid, percent: i32) -> Result<bool, StoreError>;

    /// Bumps `updated_at` if the job is still in `status` with the
    /// `updated_at` the caller read. Returns `false` when the job moved since,
    /// so only one caller acts per observed state.
    async fn touch(
        &self,
        job_id: Uuid,
        status: JobStatus,
        seen_updated_at: OffsetDateTime,
    ) -> Result<bool, StoreError>;

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<UploadJob>, StoreError>;

    async fn list_stale(
        &self,
        status: JobStatus,
        updated_before: OffsetDateTime,
    ) -> Result<Vec<UploadJob>, StoreError>;
}

pub fn clamp_progress(percent: i32) -> i32 {
    percent.clamp(0, 100)
}

pub struct PgUploadJobStore {
    pool: PgPool,
}

impl PgUploadJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, job_id: Uuid) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM upload_jobs WHERE id = $1)")
                .bind(job_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UploadJobStore for PgUploadJobStore {
    async fn create(&self, job: NewUploadJob) -> Result<UploadJob, StoreError> {
        let job = sqlx::query_as::<_, UploadJob>(
            r#"
            INSERT INTO upload_jobs
                (id, user_id, content_id, episode_id, kind, file_name, file_size, upload_url, status, progress)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', 0)
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(job.user_id)
        .bind(job.content_id)
        .bind(job.episode_id)
        .bind(job.kind)
        .bind(&job.file_name)
        .bind(job.file_size)
        .bind(&job.upload_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get(&self, job_id: Uuid) -> Result<UploadJob, StoreError> {
        sqlx::query_as::<_, UploadJob>("SELECT * FROM upload_jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(job_id))
    }

    async fn transition(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
        update: JobUpdate,
    ) -> Result<UploadJob, StoreError> {
        if !from.can_transition_to(to) {
            let current = self.get(job_id).await?.status;
            return Err(StoreError::Conflict {
                job_id,
                expected: from,
                current,
            });
        }

        let updated = sqlx::query_as::<_, UploadJob>(
            r#"
            UPDATE upload_jobs
            SET
                status = $3,
                processed_url = COALESCE($4, processed_url),
                progress = COALESCE($5, progress),
                error_message = COALESCE($6, error_message),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(from)
        .bind(to)
        .bind(update.processed_url)
        .bind(update.progress.map(clamp_progress))
        .bind(update.error_message)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(job) => Ok(job),
            None => {
                let current = self.get(job_id).await?.status;
                Err(StoreError::Conflict {
                    job_id,
                    expected: from,
                    current,
                })
            }
        }
    }

    async fn set_progress(&self, job_id: Uuid, percent: i32) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE upload_jobs
            SET progress = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'processing' AND progress <= $2
            "#,
        )
        .bind(job_id)
        .bind(clamp_progress(percent))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.exists(job_id).await? {
            Ok(false)
        } else {
            Err(StoreError::NotFound(job_id))
        }
    }

    async fn touch(
        &self,
        job_id: Uuid,
        status: JobStatus,
        seen_updated_at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE upload_jobs
            SET updated_at = NOW()
            WHERE id = $1 AND status = $2 AND updated_at = $3
            "#,
        )
        .bind(job_id)
        .bind(status)
        .bind(seen_updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<UploadJob>, StoreError> {
        let jobs = sqlx::query_as::<_, UploadJob>(
            "SELECT * FROM upload_jobs WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn list_stale(
        &self,
        status: JobStatus,
        updated_before: OffsetDateTime,
    ) -> Result<Vec<UploadJob>, StoreError> {
        let jobs = sqlx::query_as::<_, UploadJob>(
            r#"
            SELECT * FROM upload_jobs
            WHERE status = $1 AND updated_at < $2
            ORDER BY updated_at ASC
            LIMIT 500
            "#,
        )
        .bind(status)
        .bind(updated_before)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }
}
