use axum::Router;
use axum::extract::FromRef;
use axum::routing::delete;

use self::service::CatalogService;

pub mod cleanup;
pub mod handler;
pub mod repository;
pub mod service;

/// Admin catalog routes. Authentication and the admin guard are layered on by
/// the caller.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    CatalogService: FromRef<S>,
{
    Router::new().route("/contents/{id}", delete(handler::delete_content))
}
