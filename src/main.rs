use anyhow::{anyhow, Context};
use cron::Schedule;
use dotenvy::dotenv;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::connect_to_db;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::catalog::repository::PgCatalogStore;
use crate::state::AppState;
use crate::workers::processor::FfmpegProcessor;
use crate::workers::reconciler::{start_reconciler, Reconciler};
use crate::workers::runner::JobRunner;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod middleware;
mod modules;
mod routes;
mod state;
mod workers;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting upload pipeline...");

    let config = AppConfig::new()?;

    let db = connect_to_db(&config.database_url, config.store_timeout())
        .await
        .context("Failed to connect to PostgreSQL")?;
    let redis = RedisService::new(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    let storage = StorageService::new(
        &config.minio_url,
        &config.minio_bucket,
        &config.minio_access_key,
        &config.minio_secret_key,
    )
    .await;
    let queue = RabbitMqService::new(&config.rabbitmq_url).await?;

    let state = AppState::new(config.clone(), db, redis, storage, queue);

    if config.worker_enabled {
        spawn_background_workers(&state)?;
    }

    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Starts the processing worker pool and the reconciliation sweep.
fn spawn_background_workers(state: &AppState) -> anyhow::Result<()> {
    let schedule = Schedule::from_str(&state.config.reconcile_schedule)
        .map_err(|e| anyhow!("Invalid RECONCILE_SCHEDULE: {}", e))?;

    let storage = Arc::new(state.storage.clone());
    let runner = Arc::new(JobRunner::new(
        state.uploads.jobs(),
        Arc::new(PgCatalogStore::new(state.db.clone())),
        storage.clone(),
        Arc::new(FfmpegProcessor::new(state.storage.clone())),
        state.config.stale_processing_after(),
    ));

    let queue = state.queue.clone();
    let concurrency = state.config.worker_concurrency;
    tokio::spawn(async move {
        if let Err(e) =
            workers::consumer::start_processing_workers(queue, runner, concurrency).await
        {
            error!("Processing workers stopped: {}", e);
        }
    });

    let reconciler = Reconciler::new(
        state.uploads.clone(),
        state.config.stale_processing_after(),
        state.config.requeue_uploaded_after(),
    );
    tokio::spawn(start_reconciler(reconciler, schedule));

    Ok(())
}
