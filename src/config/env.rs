use std::env;
use std::str::FromStr;

use crate::config::settings::ConfigError;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    RedisUrl,
    RabbitMqUrl,
    MinioUrl,
    MinioBucket,
    MinioAccessKey,
    MinioSecretKey,
    JwtSecret,
    StoreTimeoutSecs,
    QueueTimeoutSecs,
    PresignExpirySecs,
    MaxVideoBytes,
    MaxImageBytes,
    WorkerEnabled,
    WorkerConcurrency,
    ReconcileSchedule,
    StaleProcessingSecs,
    RequeueUploadedSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::RabbitMqUrl => "RABBITMQ_URL",
            EnvKey::MinioUrl => "MINIO_ENDPOINT",
            EnvKey::MinioBucket => "MINIO_BUCKET_UPLOADS",
            EnvKey::MinioAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::MinioSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::StoreTimeoutSecs => "STORE_TIMEOUT_SECS",
            EnvKey::QueueTimeoutSecs => "QUEUE_TIMEOUT_SECS",
            EnvKey::PresignExpirySecs => "PRESIGN_EXPIRY_SECS",
            EnvKey::MaxVideoBytes => "MAX_VIDEO_BYTES",
            EnvKey::MaxImageBytes => "MAX_IMAGE_BYTES",
            EnvKey::WorkerEnabled => "WORKER_ENABLED",
            EnvKey::WorkerConcurrency => "WORKER_CONCURRENCY",
            EnvKey::ReconcileSchedule => "RECONCILE_SCHEDULE",
            EnvKey::StaleProcessingSecs => "STALE_PROCESSING_SECS",
            EnvKey::RequeueUploadedSecs => "REQUEUE_UPLOADED_SECS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// `default` when the variable is unset or blank, an error when it is set to
/// something that does not parse.
pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> Result<T, ConfigError> {
    parse_value(key.as_str(), env::var(key.as_str()).ok(), default)
}

pub fn parse_value<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::Invalid {
            key: name,
            reason: format!("cannot parse {:?}", value),
        }),
    }
}
