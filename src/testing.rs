//! In-memory doubles for the pipeline's seams, shared by unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::infrastructure::storage::{ObjectStore, UploadUrlSigner};
use crate::modules::catalog::repository::{CatalogError, CatalogStore, CatalogTarget, ContentMedia};
use crate::modules::upload::events::ProcessingTask;
use crate::modules::upload::model::{FileKind, JobStatus, JobUpdate, NewUploadJob, UploadJob};
use crate::modules::upload::queue::{JobQueue, QueueError};
use crate::modules::upload::repository::{clamp_progress, StoreError, UploadJobStore};
use crate::modules::upload::service::{UploadPolicy, UploadService};

pub fn pending_job(owner: Uuid, kind: FileKind, upload_url: &str) -> UploadJob {
    let now = OffsetDateTime::now_utc();
    let content_id = match kind {
        FileKind::Video | FileKind::Poster => Some(Uuid::new_v4()),
        FileKind::Avatar => None,
    };

    UploadJob {
        id: Uuid::new_v4(),
        user_id: owner,
        content_id,
        episode_id: None,
        kind,
        file_name: "upload.bin".to_string(),
        file_size: 1024,
        upload_url: upload_url.to_string(),
        processed_url: None,
        status: JobStatus::Pending,
        progress: 0,
        error_message: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn upload_service(
    store: Arc<dyn UploadJobStore>,
    queue: Arc<dyn JobQueue>,
    catalog: Arc<dyn CatalogStore>,
) -> UploadService {
    UploadService::new(
        store,
        queue,
        catalog,
        Arc::new(FakeSigner),
        UploadPolicy::default(),
    )
}

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, UploadJob>>,
}

impl MemoryJobStore {
    pub fn insert(&self, job: UploadJob) -> UploadJob {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        job
    }

    pub fn snapshot(&self, job_id: Uuid) -> UploadJob {
        self.jobs.lock().unwrap()[&job_id].clone()
    }

    /// Moves a job's last update into the past, as if it had gone quiet.
    pub fn age(&self, job_id: Uuid, by: Duration) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&job_id) {
            job.updated_at -= by;
        }
    }
}

#[async_trait]
impl UploadJobStore for MemoryJobStore {
    async fn create(&self, job: NewUploadJob) -> Result<UploadJob, StoreError> {
        let now = OffsetDateTime::now_utc();
        let job = UploadJob {
            id: job.id,
            user_id: job.user_id,
            content_id: job.content_id,
            episode_id: job.episode_id,
            kind: job.kind,
            file_name: job.file_name,
            file_size: job.file_size,
            upload_url: job.upload_url,
            processed_url: None,
            status: JobStatus::Pending,
            progress: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.insert(job))
    }

    async fn get(&self, job_id: Uuid) -> Result<UploadJob, StoreError> {
        self.jobs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or(StoreError::NotFound(job_id))
    }

    async fn transition(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
        update: JobUpdate,
    ) -> Result<UploadJob, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound(job_id))?;

        if job.status != from || !from.can_transition_to(to) {
            return Err(StoreError::Conflict {
                job_id,
                expected: from,
                current: job.status,
            });
        }

        job.status = to;
        if let Some(url) = update.processed_url {
            job.processed_url = Some(url);
        }
        if let Some(progress) = update.progress {
            job.progress = clamp_progress(progress);
        }
        if let Some(message) = update.error_message {
            job.error_message = Some(message);
        }
        job.updated_at = OffsetDateTime::now_utc();
        Ok(job.clone())
    }

    async fn set_progress(&self, job_id: Uuid, percent: i32) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound(job_id))?;

        let percent = clamp_progress(percent);
        if job.status != JobStatus::Processing || percent < job.progress {
            return Ok(false);
        }

        job.progress = percent;
        job.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn touch(
        &self,
        job_id: Uuid,
        status: JobStatus,
        seen_updated_at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound(job_id))?;

        if job.status != status || job.updated_at != seen_updated_at {
            return Ok(false);
        }

        job.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<UploadJob>, StoreError> {
        let mut jobs: Vec<UploadJob> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|job| job.user_id == user_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn list_stale(
        &self,
        status: JobStatus,
        updated_before: OffsetDateTime,
    ) -> Result<Vec<UploadJob>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|job| job.status == status && job.updated_at < updated_before)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    tasks: Mutex<Vec<ProcessingTask>>,
    unavailable: AtomicBool,
}

impl RecordingQueue {
    pub fn unavailable() -> Self {
        let queue = Self::default();
        queue.unavailable.store(true, Ordering::SeqCst);
        queue
    }

    pub fn tasks(&self) -> Vec<ProcessingTask> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, task: &ProcessingTask) -> Result<String, QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Broker("connection refused".to_string()));
        }
        self.tasks.lock().unwrap().push(task.clone());
        Ok(Uuid::new_v4().to_string())
    }
}

#[derive(Default)]
pub struct RecordingCatalog {
    writes: Mutex<Vec<(CatalogTarget, String)>>,
    avatars: Mutex<HashMap<Uuid, String>>,
    contents: Mutex<HashMap<Uuid, ContentMedia>>,
}

impl RecordingCatalog {
    pub fn set_avatar(&self, user_id: Uuid, url: &str) {
        self.avatars.lock().unwrap().insert(user_id, url.to_string());
    }

    pub fn add_content(&self, content_id: Uuid, media: ContentMedia) {
        self.contents.lock().unwrap().insert(content_id, media);
    }

    pub fn has_content(&self, content_id: Uuid) -> bool {
        self.contents.lock().unwrap().contains_key(&content_id)
    }

    pub fn writes(&self) -> Vec<(CatalogTarget, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogStore for RecordingCatalog {
    async fn current_avatar_url(&self, user_id: Uuid) -> Result<Option<String>, CatalogError> {
        Ok(self.avatars.lock().unwrap().get(&user_id).cloned())
    }

    async fn apply_processed(&self, target: CatalogTarget, url: &str) -> Result<(), CatalogError> {
        if let CatalogTarget::UserAvatar(user_id) = target {
            self.set_avatar(user_id, url);
        }
        self.writes.lock().unwrap().push((target, url.to_string()));
        Ok(())
    }

    async fn content_media(&self, content_id: Uuid) -> Result<Option<ContentMedia>, CatalogError> {
        Ok(self.contents.lock().unwrap().get(&content_id).cloned())
    }

    async fn delete_content(&self, content_id: Uuid) -> Result<bool, CatalogError> {
        Ok(self.contents.lock().unwrap().remove(&content_id).is_some())
    }
}

#[derive(Default)]
pub struct RecordingObjectStore {
    deleted: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl RecordingObjectStore {
    pub fn failing_on<const N: usize>(locations: [&str; N]) -> Self {
        Self {
            deleted: Mutex::default(),
            failing: locations.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn delete_object(&self, location: &str) -> anyhow::Result<()> {
        if self.failing.contains(location) {
            anyhow::bail!("access denied for {}", location);
        }
        self.deleted.lock().unwrap().push(location.to_string());
        Ok(())
    }
}

pub struct FakeSigner;

#[async_trait]
impl UploadUrlSigner for FakeSigner {
    fn object_url(&self, key: &str) -> String {
        format!("s3://media/{}", key)
    }

    async fn presign_upload(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        Ok(format!(
            "https://storage.test/media/{}?signature=test&expires={}",
            key,
            expires_in.as_secs()
        ))
    }
}
