use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::middleware::auth::auth_middleware;
use crate::middleware::role::admin_guard;
use crate::state::AppState;

pub fn configure_routes(state: AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api_routes())
        .nest("/api/v1/upload", upload_routes(state.clone()))
        .nest("/api/v1", catalog_routes(state))
        .layer(cors)
}

fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(|| async { "ok" }))
}

fn upload_routes(state: AppState) -> Router<AppState> {
    crate::modules::upload::routes()
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn catalog_routes(state: AppState) -> Router<AppState> {
    crate::modules::catalog::routes()
        .route_layer(middleware::from_fn(admin_guard))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
