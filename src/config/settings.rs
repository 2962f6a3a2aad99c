use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::env::{self, EnvKey};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub rabbitmq_url: String,
    pub minio_url: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub jwt_secret: String,
    pub store_timeout_secs: u64,
    pub queue_timeout_secs: u64,
    pub presign_expiry_secs: u64,
    pub max_video_bytes: i64,
    pub max_image_bytes: i64,
    pub worker_enabled: bool,
    pub worker_concurrency: usize,
    pub reconcile_schedule: String,
    pub stale_processing_secs: u64,
    pub requeue_uploaded_secs: u64,
}

fn required(key: EnvKey) -> Result<String, ConfigError> {
    let name = key.as_str();
    env::get(key).map_err(|_| ConfigError::Missing(name))
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000)?,
            database_url: required(EnvKey::DatabaseUrl)?,
            redis_url: required(EnvKey::RedisUrl)?,
            rabbitmq_url: required(EnvKey::RabbitMqUrl)?,
            minio_url: required(EnvKey::MinioUrl)?,
            minio_bucket: required(EnvKey::MinioBucket)?,
            minio_access_key: required(EnvKey::MinioAccessKey)?,
            minio_secret_key: required(EnvKey::MinioSecretKey)?,
            jwt_secret: required(EnvKey::JwtSecret)?,
            store_timeout_secs: env::get_parsed(EnvKey::StoreTimeoutSecs, 5)?,
            queue_timeout_secs: env::get_parsed(EnvKey::QueueTimeoutSecs, 5)?,
            presign_expiry_secs: env::get_parsed(EnvKey::PresignExpirySecs, 900)?,
            max_video_bytes: env::get_parsed(EnvKey::MaxVideoBytes, 5 * 1024 * 1024 * 1024)?,
            max_image_bytes: env::get_parsed(EnvKey::MaxImageBytes, 10 * 1024 * 1024)?,
            worker_enabled: env::get_parsed(EnvKey::WorkerEnabled, false)?,
            worker_concurrency: env::get_parsed(EnvKey::WorkerConcurrency, 2)?,
            // sec min hour day-of-month month day-of-week
            reconcile_schedule: env::get_or(EnvKey::ReconcileSchedule, "0 * * * * *"),
            stale_processing_secs: env::get_parsed(EnvKey::StaleProcessingSecs, 3600)?,
            requeue_uploaded_secs: env::get_parsed(EnvKey::RequeueUploadedSecs, 300)?,
        };

        if config.worker_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: EnvKey::WorkerConcurrency.as_str(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout_secs)
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }

    pub fn stale_processing_after(&self) -> Duration {
        Duration::from_secs(self.stale_processing_secs)
    }

    pub fn requeue_uploaded_after(&self) -> Duration {
        Duration::from_secs(self.requeue_uploaded_secs)
    }
}
