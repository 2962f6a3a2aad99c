use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::dto::RequestUploadRequest;
use super::error::UploadError;
use super::events::ProcessingTask;
use super::model::{Caller, FileKind, JobStatus, JobUpdate, NewUploadJob, UploadJob};
use super::queue::{JobQueue, QueueError};
use super::repository::{StoreError, UploadJobStore};
use crate::config::settings::AppConfig;
use crate::infrastructure::storage::UploadUrlSigner;
use crate::modules::catalog::repository::CatalogStore;

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_video_bytes: i64,
    pub max_image_bytes: i64,
    pub store_timeout: Duration,
    pub queue_timeout: Duration,
    pub presign_expiry: Duration,
}

impl UploadPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_video_bytes: config.max_video_bytes,
            max_image_bytes: config.max_image_bytes,
            store_timeout: config.store_timeout(),
            queue_timeout: config.queue_timeout(),
            presign_expiry: config.presign_expiry(),
        }
    }

    fn max_bytes(&self, kind: FileKind) -> i64 {
        match kind {
            FileKind::Video => self.max_video_bytes,
            FileKind::Avatar | FileKind::Poster => self.max_image_bytes,
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_video_bytes: 5 * 1024 * 1024 * 1024,
            max_image_bytes: 10 * 1024 * 1024,
            store_timeout: Duration::from_secs(5),
            queue_timeout: Duration::from_secs(5),
            presign_expiry: Duration::from_secs(900),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    /// The job moved to `uploaded` and one processing task was published.
    Dispatched {
        job_id: Uuid,
        queue_task_id: String,
        status: JobStatus,
    },
    /// The job had already left `pending`; nothing was published.
    AlreadyProcessed { job_id: Uuid, status: JobStatus },
}

#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub job: UploadJob,
    pub signed_url: String,
    pub expires_in: Duration,
}

/// Coordinates upload completion: validates the caller's notification, moves
/// the job out of `pending` exactly once, and hands it to the processing queue.
#[derive(Clone)]
pub struct UploadService {
    jobs: Arc<dyn UploadJobStore>,
    queue: Arc<dyn JobQueue>,
    catalog: Arc<dyn CatalogStore>,
    signer: Arc<dyn UploadUrlSigner>,
    policy: UploadPolicy,
}

impl UploadService {
    pub fn new(
        jobs: Arc<dyn UploadJobStore>,
        queue: Arc<dyn JobQueue>,
        catalog: Arc<dyn CatalogStore>,
        signer: Arc<dyn UploadUrlSigner>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            jobs,
            queue,
            catalog,
            signer,
            policy,
        }
    }

    pub fn jobs(&self) -> Arc<dyn UploadJobStore> {
        self.jobs.clone()
    }

    async fn store<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.policy.store_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn publish(&self, task: &ProcessingTask) -> Result<String, QueueError> {
        tokio::time::timeout(self.policy.queue_timeout, self.queue.enqueue(task))
            .await
            .map_err(|_| QueueError::Timeout)?
    }

    // --- SLOT REGISTRATION ---

    pub async fn request_upload(
        &self,
        caller: Caller,
        req: RequestUploadRequest,
    ) -> Result<UploadSlot, UploadError> {
        req.validate()
            .map_err(|e| UploadError::Validation(e.to_string()))?;

        let kind = req.kind;
        if kind != FileKind::Avatar && !caller.is_admin {
            return Err(UploadError::Forbidden);
        }

        let limit = self.policy.max_bytes(kind);
        if req.file_size > limit {
            return Err(UploadError::Validation(format!(
                "File too large (max: {} bytes)",
                limit
            )));
        }

        let content_type: mime::Mime = req
            .content_type
            .parse()
            .map_err(|_| UploadError::Validation(format!("Invalid content type: {}", req.content_type)))?;
        if content_type.type_() != kind.accepted_mime_type() {
            return Err(UploadError::Validation(format!(
                "Invalid content type for {} upload: {}",
                kind, req.content_type
            )));
        }

        let (content_id, episode_id) = match kind {
            FileKind::Video if req.content_id.is_none() && req.episode_id.is_none() => {
                return Err(UploadError::Validation(
                    "Video uploads require a content or episode id".to_string(),
                ));
            }
            FileKind::Video => (req.content_id, req.episode_id),
            FileKind::Poster => match req.content_id {
                Some(id) => (Some(id), None),
                None => {
                    return Err(UploadError::Validation(
                        "Poster uploads require a content id".to_string(),
                    ));
                }
            },
            FileKind::Avatar => (None, None),
        };

        let job_id = Uuid::new_v4();
        let key = format!("uploads/{}/{}/{}", kind, job_id, sanitize_file_name(&req.file_name));
        let file_url = self.signer.object_url(&key);

        let signed_url = self
            .signer
            .presign_upload(&key, &req.content_type, self.policy.presign_expiry)
            .await
            .map_err(|e| UploadError::StorageUnavailable(e.to_string()))?;

        let job = self
            .store(self.jobs.create(NewUploadJob {
                id: job_id,
                user_id: caller.user_id,
                content_id,
                episode_id,
                kind,
                file_name: req.file_name,
                file_size: req.file_size,
                upload_url: file_url,
            }))
            .await?;

        info!(job_id = %job.id, kind = %kind, user_id = %caller.user_id, "Upload slot issued");

        Ok(UploadSlot {
            job,
            signed_url,
            expires_in: self.policy.presign_expiry,
        })
    }

    // --- COMPLETION ---

    pub async fn complete_upload(
        &self,
        caller: Caller,
        job_id: Uuid,
        reported_url: &str,
    ) -> Result<CompleteOutcome, UploadError> {
        let job = self.store(self.jobs.get(job_id)).await?;

        if !caller.may_act_on(&job) {
            warn!(job_id = %job_id, caller = %caller.user_id, "Completion rejected: caller does not own job");
            return Err(UploadError::Forbidden);
        }

        if job.status != JobStatus::Pending {
            info!(job_id = %job_id, status = %job.status, "Completion ignored: upload already processed");
            return Ok(CompleteOutcome::AlreadyProcessed {
                job_id,
                status: job.status,
            });
        }

        if reported_url != job.upload_url {
            warn!(job_id = %job_id, "Completion rejected: reported URL does not match issued URL");
            return Err(UploadError::UrlMismatch);
        }

        let task = self.build_task(&job).await?;

        // The pending -> uploaded compare-and-set is the only dispatch gate.
        match self
            .store(self.jobs.transition(
                job_id,
                JobStatus::Pending,
                JobStatus::Uploaded,
                JobUpdate::default(),
            ))
            .await
        {
            Ok(_) => {}
            Err(StoreError::Conflict { current, .. }) => {
                info!(job_id = %job_id, status = %current, "Completion lost the race: upload already processed");
                return Ok(CompleteOutcome::AlreadyProcessed {
                    job_id,
                    status: current,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let queue_task_id = self.publish(&task).await.map_err(|e| {
            error!(job_id = %job_id, error = %e, "Enqueue failed, job left uploaded for re-dispatch");
            UploadError::from(e)
        })?;

        info!(job_id = %job_id, task_id = %queue_task_id, kind = %job.kind, "Upload accepted for processing");

        Ok(CompleteOutcome::Dispatched {
            job_id,
            queue_task_id,
            status: JobStatus::Uploaded,
        })
    }

    /// Publishes the task for a job that is already `uploaded` but was never
    /// picked up. The job's `updated_at` is bumped first, so concurrent
    /// sweeps that read the same row publish once. Returns `None` when the
    /// job moved since it was read.
    pub async fn redispatch(&self, job: &UploadJob) -> Result<Option<String>, UploadError> {
        if job.status != JobStatus::Uploaded {
            return Err(UploadError::Validation(format!(
                "job {} is {}, only uploaded jobs are re-dispatched",
                job.id, job.status
            )));
        }

        let claimed = self
            .store(self.jobs.touch(job.id, JobStatus::Uploaded, job.updated_at))
            .await?;
        if !claimed {
            debug!(job_id = %job.id, "Job moved since it was listed, skipping re-dispatch");
            return Ok(None);
        }

        let task = self.build_task(job).await?;
        Ok(Some(self.publish(&task).await?))
    }

    async fn build_task(&self, job: &UploadJob) -> Result<ProcessingTask, UploadError> {
        let previous_avatar = match job.kind {
            FileKind::Avatar => {
                let lookup = self.catalog.current_avatar_url(job.user_id);
                tokio::time::timeout(self.policy.store_timeout, lookup)
                    .await
                    .map_err(|_| {
                        UploadError::CatalogUnavailable("catalog did not respond in time".to_string())
                    })??
            }
            FileKind::Video | FileKind::Poster => None,
        };

        Ok(ProcessingTask::from_job(job, previous_avatar)?)
    }

    // --- QUERIES ---

    pub async fn get_job(&self, caller: Caller, job_id: Uuid) -> Result<UploadJob, UploadError> {
        let job = self.store(self.jobs.get(job_id)).await?;
        if !caller.may_act_on(&job) {
            return Err(UploadError::Forbidden);
        }
        Ok(job)
    }

    pub async fn list_jobs(&self, caller: Caller) -> Result<Vec<UploadJob>, UploadError> {
        Ok(self.store(self.jobs.list_by_owner(caller.user_id)).await?)
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::repository::{CatalogError, CatalogTarget, ContentMedia};
    use crate::testing::{
        pending_job, upload_service, FakeSigner, MemoryJobStore, RecordingCatalog, RecordingQueue,
    };
    use async_trait::async_trait;
    use time::OffsetDateTime;

    struct Harness {
        store: Arc<MemoryJobStore>,
        queue: Arc<RecordingQueue>,
        catalog: Arc<RecordingCatalog>,
        service: UploadService,
    }

    fn harness() -> Harness {
        harness_with_queue(RecordingQueue::default())
    }

    fn harness_with_queue(queue: RecordingQueue) -> Harness {
        let store = Arc::new(MemoryJobStore::default());
        let queue = Arc::new(queue);
        let catalog = Arc::new(RecordingCatalog::default());
        let service = upload_service(store.clone(), queue.clone(), catalog.clone());
        Harness {
            store,
            queue,
            catalog,
            service,
        }
    }

    #[tokio::test]
    async fn owner_completion_dispatches_once() {
        let h = harness();
        let owner = Uuid::new_v4();
        let job = h.store.insert(pending_job(owner, FileKind::Video, "s3://bucket/a.mp4"));

        let outcome = h
            .service
            .complete_upload(Caller::user(owner), job.id, "s3://bucket/a.mp4")
            .await
            .unwrap();

        match outcome {
            CompleteOutcome::Dispatched { status, queue_task_id, .. } => {
                assert_eq!(status, JobStatus::Uploaded);
                assert!(!queue_task_id.is_empty());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(h.store.snapshot(job.id).status, JobStatus::Uploaded);
        assert_eq!(h.queue.tasks().len(), 1);
        assert_eq!(h.queue.tasks()[0].job_id(), job.id);
    }

    #[tokio::test]
    async fn repeated_completion_reports_already_processed_without_second_enqueue() {
        let h = harness();
        let owner = Uuid::new_v4();
        let job = h.store.insert(pending_job(owner, FileKind::Video, "s3://bucket/a.mp4"));

        h.service
            .complete_upload(Caller::user(owner), job.id, "s3://bucket/a.mp4")
            .await
            .unwrap();
        let second = h
            .service
            .complete_upload(Caller::user(owner), job.id, "s3://bucket/a.mp4")
            .await
            .unwrap();

        assert_eq!(
            second,
            CompleteOutcome::AlreadyProcessed {
                job_id: job.id,
                status: JobStatus::Uploaded
            }
        );
        assert_eq!(h.store.snapshot(job.id).status, JobStatus::Uploaded);
        assert_eq!(h.queue.tasks().len(), 1);
    }

    #[tokio::test]
    async fn stranger_is_forbidden_and_job_untouched() {
        let h = harness();
        let owner = Uuid::new_v4();
        let job = h.store.insert(pending_job(owner, FileKind::Video, "s3://bucket/a.mp4"));

        let err = h
            .service
            .complete_upload(Caller::user(Uuid::new_v4()), job.id, "s3://bucket/a.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Forbidden));
        let stored = h.store.snapshot(job.id);
        assert_eq!(stored.status, JobStatus::Pending);
        assert_eq!(stored.updated_at, job.updated_at);
        assert!(h.queue.tasks().is_empty());
    }

    #[tokio::test]
    async fn admin_may_complete_any_job() {
        let h = harness();
        let job = h
            .store
            .insert(pending_job(Uuid::new_v4(), FileKind::Poster, "s3://bucket/p.png"));

        let outcome = h
            .service
            .complete_upload(Caller::admin(Uuid::new_v4()), job.id, "s3://bucket/p.png")
            .await
            .unwrap();

        assert!(matches!(outcome, CompleteOutcome::Dispatched { .. }));
        assert!(matches!(h.queue.tasks()[0], ProcessingTask::Poster(_)));
    }

    #[tokio::test]
    async fn mismatched_url_is_rejected_and_job_stays_pending() {
        let h = harness();
        let owner = Uuid::new_v4();
        let job = h.store.insert(pending_job(owner, FileKind::Video, "s3://bucket/a.mp4"));

        let err = h
            .service
            .complete_upload(Caller::user(owner), job.id, "s3://bucket/other.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::UrlMismatch));
        assert_eq!(h.store.snapshot(job.id).status, JobStatus::Pending);
        assert!(h.queue.tasks().is_empty());
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let h = harness();

        let err = h
            .service
            .complete_upload(Caller::user(Uuid::new_v4()), Uuid::new_v4(), "s3://bucket/a.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::NotFound));
    }

    #[tokio::test]
    async fn queue_outage_leaves_job_uploaded_and_is_retryable() {
        let h = harness_with_queue(RecordingQueue::unavailable());
        let owner = Uuid::new_v4();
        let job = h.store.insert(pending_job(owner, FileKind::Video, "s3://bucket/a.mp4"));

        let err = h
            .service
            .complete_upload(Caller::user(owner), job.id, "s3://bucket/a.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::QueueUnavailable(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(h.store.snapshot(job.id).status, JobStatus::Uploaded);
    }

    #[tokio::test]
    async fn invalid_job_target_is_rejected_before_any_transition() {
        let h = harness();
        let owner = Uuid::new_v4();
        let mut job = pending_job(owner, FileKind::Poster, "s3://bucket/p.png");
        job.content_id = None;
        let job = h.store.insert(job);

        let err = h
            .service
            .complete_upload(Caller::admin(owner), job.id, "s3://bucket/p.png")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Validation(_)));
        assert_eq!(h.store.snapshot(job.id).status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn avatar_task_includes_previous_avatar() {
        let h = harness();
        let owner = Uuid::new_v4();
        h.catalog.set_avatar(owner, "s3://bucket/avatars/old.jpg");
        let job = h.store.insert(pending_job(owner, FileKind::Avatar, "s3://bucket/me.png"));

        h.service
            .complete_upload(Caller::user(owner), job.id, "s3://bucket/me.png")
            .await
            .unwrap();

        match &h.queue.tasks()[0] {
            ProcessingTask::Avatar(task) => assert_eq!(
                task.previous_avatar_url.as_deref(),
                Some("s3://bucket/avatars/old.jpg")
            ),
            other => panic!("unexpected task {other:?}"),
        }
    }

    /// Never answers the avatar lookup.
    struct HangingCatalog;

    #[async_trait]
    impl CatalogStore for HangingCatalog {
        async fn current_avatar_url(&self, _user_id: Uuid) -> Result<Option<String>, CatalogError> {
            std::future::pending().await
        }

        async fn apply_processed(&self, _target: CatalogTarget, _url: &str) -> Result<(), CatalogError> {
            Ok(())
        }

        async fn content_media(&self, _content_id: Uuid) -> Result<Option<ContentMedia>, CatalogError> {
            Ok(None)
        }

        async fn delete_content(&self, _content_id: Uuid) -> Result<bool, CatalogError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn slow_avatar_lookup_times_out_and_job_stays_pending() {
        let store = Arc::new(MemoryJobStore::default());
        let queue = Arc::new(RecordingQueue::default());
        let policy = UploadPolicy {
            store_timeout: Duration::from_millis(50),
            ..UploadPolicy::default()
        };
        let service = UploadService::new(
            store.clone(),
            queue.clone(),
            Arc::new(HangingCatalog),
            Arc::new(FakeSigner),
            policy,
        );
        let owner = Uuid::new_v4();
        let job = store.insert(pending_job(owner, FileKind::Avatar, "s3://bucket/me.png"));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            service.complete_upload(Caller::user(owner), job.id, "s3://bucket/me.png"),
        )
        .await
        .expect("completion must not hang on the catalog");

        let err = result.unwrap_err();
        assert!(matches!(err, UploadError::CatalogUnavailable(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(store.snapshot(job.id).status, JobStatus::Pending);
        assert!(queue.tasks().is_empty());
    }

    /// Lets a competing completion win between the read and the CAS.
    struct RacingStore {
        inner: MemoryJobStore,
    }

    #[async_trait]
    impl UploadJobStore for RacingStore {
        async fn create(&self, job: NewUploadJob) -> Result<UploadJob, StoreError> {
            self.inner.create(job).await
        }

        async fn get(&self, job_id: Uuid) -> Result<UploadJob, StoreError> {
            self.inner.get(job_id).await
        }

        async fn transition(
            &self,
            job_id: Uuid,
            from: JobStatus,
            to: JobStatus,
            update: JobUpdate,
        ) -> Result<UploadJob, StoreError> {
            self.inner
                .transition(job_id, from, to, update.clone())
                .await?;
            self.inner.transition(job_id, from, to, update).await
        }

        async fn set_progress(&self, job_id: Uuid, percent: i32) -> Result<bool, StoreError> {
            self.inner.set_progress(job_id, percent).await
        }

        async fn touch(
            &self,
            job_id: Uuid,
            status: JobStatus,
            seen_updated_at: OffsetDateTime,
        ) -> Result<bool, StoreError> {
            self.inner.touch(job_id, status, seen_updated_at).await
        }

        async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<UploadJob>, StoreError> {
            self.inner.list_by_owner(user_id).await
        }

        async fn list_stale(
            &self,
            status: JobStatus,
            updated_before: OffsetDateTime,
        ) -> Result<Vec<UploadJob>, StoreError> {
            self.inner.list_stale(status, updated_before).await
        }
    }

    #[tokio::test]
    async fn losing_the_status_race_does_not_enqueue() {
        let owner = Uuid::new_v4();
        let inner = MemoryJobStore::default();
        let job = inner.insert(pending_job(owner, FileKind::Video, "s3://bucket/a.mp4"));
        let store = Arc::new(RacingStore { inner });
        let queue = Arc::new(RecordingQueue::default());
        let service = upload_service(store, queue.clone(), Arc::new(RecordingCatalog::default()));

        let outcome = service
            .complete_upload(Caller::user(owner), job.id, "s3://bucket/a.mp4")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CompleteOutcome::AlreadyProcessed {
                job_id: job.id,
                status: JobStatus::Uploaded
            }
        );
        assert!(queue.tasks().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_completions_enqueue_exactly_once() {
        let h = harness();
        let owner = Uuid::new_v4();
        let job = h.store.insert(pending_job(owner, FileKind::Video, "s3://bucket/a.mp4"));

        let job_id = job.id;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = h.service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .complete_upload(Caller::user(owner), job_id, "s3://bucket/a.mp4")
                    .await
            }));
        }

        let mut dispatched = 0;
        for handle in handles {
            if let CompleteOutcome::Dispatched { .. } = handle.await.unwrap().unwrap() {
                dispatched += 1;
            }
        }

        assert_eq!(dispatched, 1);
        assert_eq!(h.queue.tasks().len(), 1);
    }

    fn request(kind: FileKind, content_type: &str) -> RequestUploadRequest {
        RequestUploadRequest {
            kind,
            file_name: "My Movie (final).mp4".to_string(),
            file_size: 1024,
            content_type: content_type.to_string(),
            content_id: Some(Uuid::new_v4()),
            episode_id: None,
        }
    }

    #[tokio::test]
    async fn request_upload_registers_pending_job() {
        let h = harness();
        let admin = Uuid::new_v4();

        let slot = h
            .service
            .request_upload(Caller::admin(admin), request(FileKind::Video, "video/mp4"))
            .await
            .unwrap();

        let stored = h.store.snapshot(slot.job.id);
        assert_eq!(stored.status, JobStatus::Pending);
        assert_eq!(stored.user_id, admin);
        assert_eq!(
            stored.upload_url,
            format!("s3://media/uploads/video/{}/My_Movie__final_.mp4", slot.job.id)
        );
        assert!(slot.signed_url.contains("signature"));
    }

    #[tokio::test]
    async fn request_upload_validates_kind_rules() {
        let h = harness();
        let admin = Caller::admin(Uuid::new_v4());

        let wrong_type = h
            .service
            .request_upload(admin, request(FileKind::Poster, "video/mp4"))
            .await;
        assert!(matches!(wrong_type, Err(UploadError::Validation(_))));

        let mut too_big = request(FileKind::Avatar, "image/png");
        too_big.file_size = 50 * 1024 * 1024;
        let too_big = h.service.request_upload(admin, too_big).await;
        assert!(matches!(too_big, Err(UploadError::Validation(_))));

        let mut no_target = request(FileKind::Video, "video/mp4");
        no_target.content_id = None;
        let no_target = h.service.request_upload(admin, no_target).await;
        assert!(matches!(no_target, Err(UploadError::Validation(_))));

        let mut empty_name = request(FileKind::Avatar, "image/png");
        empty_name.file_name = String::new();
        let empty_name = h.service.request_upload(admin, empty_name).await;
        assert!(matches!(empty_name, Err(UploadError::Validation(_))));
    }

    #[tokio::test]
    async fn only_admins_upload_catalog_media() {
        let h = harness();
        let user = Caller::user(Uuid::new_v4());

        let video = h
            .service
            .request_upload(user, request(FileKind::Video, "video/mp4"))
            .await;
        assert!(matches!(video, Err(UploadError::Forbidden)));

        let avatar = h
            .service
            .request_upload(user, request(FileKind::Avatar, "image/jpeg"))
            .await
            .unwrap();
        assert_eq!(avatar.job.content_id, None);
    }

    #[tokio::test]
    async fn get_job_is_restricted_to_owner_or_admin() {
        let h = harness();
        let owner = Uuid::new_v4();
        let job = h.store.insert(pending_job(owner, FileKind::Avatar, "s3://bucket/me.png"));

        assert!(h.service.get_job(Caller::user(owner), job.id).await.is_ok());
        assert!(h.service.get_job(Caller::admin(Uuid::new_v4()), job.id).await.is_ok());
        assert!(matches!(
            h.service.get_job(Caller::user(Uuid::new_v4()), job.id).await,
            Err(UploadError::Forbidden)
        ));
    }

    #[test]
    fn file_names_are_sanitized_for_object_keys() {
        assert_eq!(sanitize_file_name("a b/c.mp4"), "a_b_c.mp4");
        assert_eq!(sanitize_file_name("../../etc"), "_.._etc");
        assert_eq!(sanitize_file_name("   "), "file");
    }
}
