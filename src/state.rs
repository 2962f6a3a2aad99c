use axum::extract::FromRef;
use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::catalog::cleanup::MediaCleanup;
use crate::modules::catalog::repository::{CatalogStore, PgCatalogStore};
use crate::modules::catalog::service::CatalogService;
use crate::modules::upload::queue::RabbitJobQueue;
use crate::modules::upload::repository::PgUploadJobStore;
use crate::modules::upload::service::{UploadPolicy, UploadService};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub redis: RedisService,
    pub storage: StorageService,
    pub queue: RabbitMqService,
    pub uploads: UploadService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        redis: RedisService,
        storage: StorageService,
        queue: RabbitMqService,
    ) -> Self {
        let catalog_store: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(db.clone()));
        let storage_handle = Arc::new(storage.clone());

        let uploads = UploadService::new(
            Arc::new(PgUploadJobStore::new(db.clone())),
            Arc::new(RabbitJobQueue::new(queue.clone())),
            catalog_store.clone(),
            storage_handle.clone(),
            UploadPolicy::from_config(&config),
        );
        let catalog = CatalogService::new(catalog_store, MediaCleanup::new(storage_handle));

        Self {
            config,
            db,
            redis,
            storage,
            queue,
            uploads,
            catalog,
        }
    }
}

impl FromRef<AppState> for UploadService {
    fn from_ref(state: &AppState) -> Self {
        state.uploads.clone()
    }
}

impl FromRef<AppState> for CatalogService {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}
