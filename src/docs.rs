use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::catalog::cleanup::CleanupReport;
use crate::modules::upload::dto::*;
use crate::modules::upload::model::{FileKind, JobStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::upload::handler::request_upload,
        crate::modules::upload::handler::complete_upload,
        crate::modules::upload::handler::get_job,
        crate::modules::upload::handler::list_jobs,
        crate::modules::catalog::handler::delete_content,
    ),
    components(
        schemas(
            RequestUploadRequest, UploadSlotResponse,
            CompleteUploadRequest, CompleteUploadResponse,
            UploadJobResponse, JobStatus, FileKind,
            CleanupReport,
        )
    ),
    tags(
        (name = "Upload", description = "Upload jobs and processing status"),
        (name = "Catalog", description = "Catalog media maintenance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
