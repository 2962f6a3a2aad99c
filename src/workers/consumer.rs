use anyhow::{anyhow, Result};
use futures_util::stream::{self, StreamExt};
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicNackOptions, BasicRejectOptions};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::runner::{JobRunner, RunError, RunOutcome};
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::modules::upload::events::ProcessingTask;
use crate::modules::upload::queue::{AVATAR_QUEUE, POSTER_QUEUE, VIDEO_QUEUE};

/// Consumes every processing queue and runs deliveries on `concurrency`
/// tasks. Returns only when the broker closes the consumers.
pub async fn start_processing_workers(
    queue: RabbitMqService,
    runner: Arc<JobRunner>,
    concurrency: usize,
) -> Result<()> {
    info!("🎥 Starting processing workers (concurrency: {})", concurrency);

    let prefetch = u16::try_from(concurrency).unwrap_or(u16::MAX);
    let mut consumers = Vec::new();
    for name in [VIDEO_QUEUE, AVATAR_QUEUE, POSTER_QUEUE] {
        let consumer = queue
            .consumer(name, &format!("upload-pipeline.{}", name), prefetch)
            .await?;
        info!("🎥 Worker listening on '{}'", name);
        consumers.push(consumer);
    }

    let (tx, rx) = async_channel::bounded::<Delivery>(concurrency);

    let mut workers = Vec::with_capacity(concurrency);
    for worker_id in 0..concurrency {
        let rx = rx.clone();
        let runner = runner.clone();
        workers.push(tokio::spawn(async move {
            while let Ok(delivery) = rx.recv().await {
                process_delivery(worker_id, &runner, delivery).await;
            }
        }));
    }
    drop(rx);

    let mut deliveries = stream::select_all(consumers);
    while let Some(delivery) = deliveries.next().await {
        match delivery {
            Ok(delivery) => {
                if tx.send(delivery).await.is_err() {
                    break;
                }
            }
            Err(e) => error!("Failed to receive delivery: {}", e),
        }
    }

    tx.close();
    for worker in workers {
        let _ = worker.await;
    }

    Err(anyhow!("processing consumers closed by the broker"))
}

async fn process_delivery(worker_id: usize, runner: &JobRunner, delivery: Delivery) {
    let task = match serde_json::from_slice::<ProcessingTask>(&delivery.data) {
        Ok(task) => task,
        Err(e) => {
            error!(worker_id, "❌ Malformed task payload, rejecting: {}", e);
            if let Err(e) = delivery.reject(BasicRejectOptions { requeue: false }).await {
                error!("Failed to reject message: {}", e);
            }
            return;
        }
    };

    let job_id = task.job_id();
    info!(worker_id, job_id = %job_id, kind = %task.kind(), "📦 Received processing task");

    let requeue = match runner.handle(&task).await {
        Ok(RunOutcome::Completed { processed_url }) => {
            info!(worker_id, job_id = %job_id, "Processed media at {}", processed_url);
            false
        }
        Ok(RunOutcome::Failed { reason }) => {
            warn!(worker_id, job_id = %job_id, "Processing failed: {}", reason);
            false
        }
        Ok(RunOutcome::Skipped) => false,
        // The redelivery finds the job completed and re-applies the write.
        Err(RunError::Catalog(e)) => {
            error!(worker_id, job_id = %job_id, "{}, requeueing", e);
            true
        }
        Err(RunError::Store(e)) => {
            error!(worker_id, job_id = %job_id, "Job store unavailable, requeueing: {}", e);
            true
        }
    };

    let acked = if requeue {
        delivery
            .nack(BasicNackOptions {
                requeue: true,
                ..BasicNackOptions::default()
            })
            .await
    } else {
        delivery.ack(BasicAckOptions::default()).await
    };

    if let Err(e) = acked {
        error!(worker_id, job_id = %job_id, "Failed to acknowledge message: {}", e);
    }
}
