use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Envelope shared by every JSON response.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            message: message.to_string(),
            data: None,
        }
    }
}

pub struct ApiSuccess<T>(pub T, pub StatusCode);

impl<T> ApiSuccess<ApiResponse<T>>
where
    T: Serialize,
{
    pub fn ok(data: T, message: &str) -> Self {
        Self(ApiResponse::success(data, message), StatusCode::OK)
    }

    pub fn created(data: T, message: &str) -> Self {
        Self(ApiResponse::success(data, message), StatusCode::CREATED)
    }

    /// Work was handed off and will finish asynchronously.
    pub fn accepted(data: T, message: &str) -> Self {
        Self(ApiResponse::success(data, message), StatusCode::ACCEPTED)
    }
}

impl<T> IntoResponse for ApiSuccess<ApiResponse<T>>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let (response, status) = (self.0, self.1);
        (status, Json(response)).into_response()
    }
}

#[derive(Debug)]
pub struct ApiError(pub String, pub StatusCode);

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self(message.into(), status)
    }

    pub fn status(&self) -> StatusCode {
        self.1
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, status) = (self.0, self.1);
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", message);
        }
        let response = ApiResponse::<()>::error(&message);
        (status, Json(response)).into_response()
    }
}
