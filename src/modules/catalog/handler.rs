use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use super::cleanup::CleanupReport;
use super::repository::CatalogError;
use super::service::CatalogService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};

/// Delete Content
/// Removes the catalog row, then its stored media best-effort
#[utoipa::path(
    delete,
    path = "/api/v1/contents/{id}",
    params(
        ("id" = Uuid, Path, description = "Content ID")
    ),
    responses(
        (status = 200, description = "Content deleted", body = ApiResponse<CleanupReport>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Content not found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
pub async fn delete_content(
    State(catalog): State<CatalogService>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match catalog.delete_content(id).await {
        Ok(report) => ApiSuccess::ok(report, "Content deleted successfully").into_response(),
        Err(CatalogError::ContentNotFound(_)) => {
            ApiError::new(StatusCode::NOT_FOUND, "Content not found").into_response()
        }
        Err(e) => {
            error!(content_id = %id, error = %e, "Failed to delete content");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete content").into_response()
        }
    }
}
