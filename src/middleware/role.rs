use crate::common::response::ApiError;
use crate::middleware::auth::AuthUser;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

/// Lets only admins through. Runs after `auth_middleware`, so a missing
/// identity is rejected by the extractor with 401.
pub async fn admin_guard(
    AuthUser(caller): AuthUser,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !caller.is_admin {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Forbidden: Admin access required",
        ));
    }

    Ok(next.run(req).await)
}
