use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::infrastructure::storage::s3::StorageService;
use crate::modules::upload::events::ProcessingTask;
use crate::modules::upload::model::FileKind;
use crate::modules::upload::repository::UploadJobStore;

/// Turns an uploaded source object into the processed media and returns the
/// processed object's URL. Errors become the job's failure reason.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    async fn process(&self, task: &ProcessingTask, progress: &ProgressReporter) -> Result<String>;
}

/// Heartbeat and progress channel for one job.
pub struct ProgressReporter {
    jobs: Arc<dyn UploadJobStore>,
    job_id: Uuid,
}

impl ProgressReporter {
    pub fn new(jobs: Arc<dyn UploadJobStore>, job_id: Uuid) -> Self {
        Self { jobs, job_id }
    }

    /// Never fails the job: a rejected or lost report only gets logged.
    pub async fn report(&self, percent: i32) {
        match self.jobs.set_progress(self.job_id, percent).await {
            Ok(true) => debug!(job_id = %self.job_id, percent, "Progress updated"),
            Ok(false) => debug!(job_id = %self.job_id, percent, "Progress report ignored"),
            Err(e) => warn!(job_id = %self.job_id, percent, "Failed to record progress: {}", e),
        }
    }
}

pub struct FfmpegProcessor {
    storage: StorageService,
    scratch_dir: PathBuf,
}

impl FfmpegProcessor {
    pub fn new(storage: StorageService) -> Self {
        Self {
            storage,
            scratch_dir: std::env::temp_dir(),
        }
    }

    fn output_key(kind: FileKind, job_id: Uuid) -> String {
        format!("processed/{}/{}.{}", kind, job_id, Self::extension(kind))
    }

    fn extension(kind: FileKind) -> &'static str {
        match kind {
            FileKind::Video => "mp4",
            FileKind::Avatar | FileKind::Poster => "jpg",
        }
    }

    fn content_type(kind: FileKind) -> &'static str {
        match kind {
            FileKind::Video => "video/mp4",
            FileKind::Avatar | FileKind::Poster => "image/jpeg",
        }
    }

    fn ffmpeg_args(kind: FileKind, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.display().to_string(),
        ];

        let encode: &[&str] = match kind {
            FileKind::Video => &[
                "-c:v", "libx264", "-preset", "fast", "-c:a", "aac", "-movflags", "+faststart",
            ],
            FileKind::Avatar => &["-vf", "scale=512:512:force_original_aspect_ratio=decrease", "-frames:v", "1"],
            FileKind::Poster => &["-vf", "scale=-2:1080", "-frames:v", "1"],
        };
        args.extend(encode.iter().map(|a| a.to_string()));
        args.push("-y".to_string());
        args.push(output.display().to_string());
        args
    }

    async fn transcode(&self, kind: FileKind, input: &Path, output: &Path) -> Result<()> {
        let result = Command::new("ffmpeg")
            .args(Self::ffmpeg_args(kind, input, output))
            .output()
            .await
            .map_err(|e| anyhow!("failed to start ffmpeg: {}", e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let reason = stderr.lines().last().unwrap_or("ffmpeg exited with an error").trim();
            return Err(anyhow!("{}", reason));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn process(&self, task: &ProcessingTask, progress: &ProgressReporter) -> Result<String> {
        let job_id = task.job_id();
        let kind = task.kind();
        let scratch = ScratchFiles::new(&self.scratch_dir, job_id, Self::extension(kind));

        let result = self.run(task, &scratch, progress).await;
        scratch.remove().await;
        let key = result?;

        info!(job_id = %job_id, "⬆️ Uploaded processed media to {}", key);
        Ok(self.storage.url_for(&key))
    }
}

impl FfmpegProcessor {
    async fn run(
        &self,
        task: &ProcessingTask,
        scratch: &ScratchFiles,
        progress: &ProgressReporter,
    ) -> Result<String> {
        let job_id = task.job_id();
        let kind = task.kind();

        let source_key = self.storage.key_for(task.source_url())?;
        info!(job_id = %job_id, kind = %kind, "⬇️ Downloading {}", source_key);
        let size = self
            .storage
            .download_to_file(&source_key, &scratch.input)
            .await?;
        debug!(job_id = %job_id, bytes = size, "Source downloaded");
        progress.report(10).await;

        progress.report(40).await;
        self.transcode(kind, &scratch.input, &scratch.output).await?;
        progress.report(90).await;

        let key = Self::output_key(kind, job_id);
        self.storage
            .upload_file(&key, &scratch.output, Self::content_type(kind))
            .await?;
        progress.report(100).await;

        Ok(key)
    }
}

/// Per-run scratch paths. Each run gets its own pair so overlapping runs for
/// the same job never share files.
struct ScratchFiles {
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    fn new(dir: &Path, job_id: Uuid, extension: &str) -> Self {
        let run = Uuid::new_v4();
        Self {
            input: dir.join(format!("{}_{}_input", job_id, run)),
            output: dir.join(format!("{}_{}_output.{}", job_id, run, extension)),
        }
    }

    async fn remove(&self) {
        for path in [&self.input, &self.output] {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove scratch file {}: {}", path.display(), e);
                }
            }
        }
    }
}
