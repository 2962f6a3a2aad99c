use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::middleware::auth::AuthUser;
use crate::modules::upload::dto::*;
use crate::modules::upload::service::{CompleteOutcome, UploadService};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Request Upload Slot
/// Registers a pending upload job and returns a pre-signed PUT URL
#[utoipa::path(
    post,
    path = "/api/v1/upload/request",
    request_body = RequestUploadRequest,
    responses(
        (status = 201, description = "Upload slot issued", body = ApiResponse<UploadSlotResponse>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Storage or job store unavailable")
    ),
    tag = "Upload",
    security(("bearer_auth" = []))
)]
pub async fn request_upload(
    State(uploads): State<UploadService>,
    AuthUser(caller): AuthUser,
    Json(req): Json<RequestUploadRequest>,
) -> impl IntoResponse {
    match uploads.request_upload(caller, req).await {
        Ok(slot) => {
            let res = UploadSlotResponse {
                job_id: slot.job.id,
                upload_url: slot.signed_url,
                file_url: slot.job.upload_url,
                expires_in: slot.expires_in.as_secs(),
            };
            ApiSuccess::created(res, "Upload slot issued").into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Complete Upload
/// Confirms the bytes are in storage and hands the job to processing
#[utoipa::path(
    post,
    path = "/api/v1/upload/complete",
    request_body = CompleteUploadRequest,
    responses(
        (status = 202, description = "Accepted, processing", body = ApiResponse<CompleteUploadResponse>),
        (status = 400, description = "Already processed or URL mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Job not found"),
        (status = 503, description = "Queue or job store unavailable, retry")
    ),
    tag = "Upload",
    security(("bearer_auth" = []))
)]
pub async fn complete_upload(
    State(uploads): State<UploadService>,
    AuthUser(caller): AuthUser,
    Json(req): Json<CompleteUploadRequest>,
) -> impl IntoResponse {
    match uploads.complete_upload(caller, req.job_id, &req.file_url).await {
        Ok(CompleteOutcome::Dispatched {
            job_id,
            queue_task_id,
            status,
        }) => ApiSuccess::accepted(
            CompleteUploadResponse {
                job_id,
                queue_task_id,
                status,
            },
            "Upload accepted, processing",
        )
        .into_response(),
        Ok(CompleteOutcome::AlreadyProcessed { status, .. }) => ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Upload already processed (status: {})", status),
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/upload/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Upload job ID")
    ),
    responses(
        (status = 200, description = "Get Upload Job", body = ApiResponse<UploadJobResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Job not found")
    ),
    tag = "Upload",
    security(("bearer_auth" = []))
)]
pub async fn get_job(
    State(uploads): State<UploadService>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match uploads.get_job(caller, id).await {
        Ok(job) => ApiSuccess::ok(UploadJobResponse::from(job), "Upload job retrieved successfully")
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/upload/jobs",
    responses(
        (status = 200, description = "List the caller's upload jobs", body = ApiResponse<Vec<UploadJobResponse>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Upload",
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    State(uploads): State<UploadService>,
    AuthUser(caller): AuthUser,
) -> impl IntoResponse {
    match uploads.list_jobs(caller).await {
        Ok(jobs) => {
            let res: Vec<UploadJobResponse> = jobs.into_iter().map(UploadJobResponse::from).collect();
            ApiSuccess::ok(res, "Upload jobs retrieved successfully").into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
