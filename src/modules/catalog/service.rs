use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::cleanup::{CleanupReport, MediaCleanup};
use super::repository::{CatalogError, CatalogStore};

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    cleanup: MediaCleanup,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>, cleanup: MediaCleanup) -> Self {
        Self { catalog, cleanup }
    }

    /// Deletes a content row, then removes its stored media best-effort.
    /// Upload jobs still pointing at the content are left untouched.
    pub async fn delete_content(&self, content_id: Uuid) -> Result<CleanupReport, CatalogError> {
        let media = self
            .catalog
            .content_media(content_id)
            .await?
            .ok_or(CatalogError::ContentNotFound(content_id))?;

        if !self.catalog.delete_content(content_id).await? {
            return Err(CatalogError::ContentNotFound(content_id));
        }
        info!(content_id = %content_id, "Content deleted, cleaning up stored media");

        Ok(self.cleanup.remove_all(media.locations()).await)
    }
}
