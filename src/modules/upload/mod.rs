use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, post};

use self::service::UploadService;

pub mod dto;
pub mod error;
pub mod events;
pub mod handler;
pub mod model;
pub mod queue;
pub mod repository;
pub mod service;

/// Upload routes, relative to `/api/v1/upload`. Every route needs an
/// authenticated caller; the auth middleware is layered on by the caller.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    UploadService: FromRef<S>,
{
    Router::new()
        .route("/request", post(handler::request_upload))
        .route("/complete", post(handler::complete_upload))
        .route("/jobs", get(handler::list_jobs))
        .route("/jobs/{id}", get(handler::get_job))
}
