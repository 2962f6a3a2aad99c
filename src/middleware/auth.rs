use crate::common::response::ApiError;
use crate::modules::upload::model::Caller;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

impl TokenClaims {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

fn unauthorized(message: &str) -> ApiError {
    ApiError(format!("Unauthorized: {}", message), StatusCode::UNAUTHORIZED)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract token from header
    let token = bearer_token(&req).ok_or_else(|| unauthorized("Missing or invalid token"))?;

    // 2. Check if token is blocked in Redis
    let is_blocked = state.redis.is_token_blocked(&token).await.map_err(|_| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error: Redis unavailable",
        )
    })?;

    if is_blocked {
        return Err(unauthorized("Token is blocked/revoked"));
    }

    // 3. Verify JWT
    let claims = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| unauthorized("Invalid token signature"))?
    .claims;

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// The authenticated caller, read from the claims the middleware verified.
pub struct AuthUser(pub Caller);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<TokenClaims>()
            .ok_or_else(|| unauthorized("Missing or invalid token"))?;

        Ok(AuthUser(Caller {
            user_id: claims.sub,
            is_admin: claims.is_admin(),
        }))
    }
}
