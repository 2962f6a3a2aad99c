use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::infrastructure::storage::ObjectStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

/// Best-effort removal of stored media. Failures are logged and reported,
/// never returned as errors: an orphaned object is an accepted outcome.
#[derive(Clone)]
pub struct MediaCleanup {
    objects: Arc<dyn ObjectStore>,
}

impl MediaCleanup {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    pub async fn remove_all(&self, locations: Vec<String>) -> CleanupReport {
        let mut report = CleanupReport::default();

        for location in locations {
            match self.objects.delete_object(&location).await {
                Ok(()) => report.removed.push(location),
                Err(e) => {
                    warn!(location = %location, error = %e, "Failed to delete stored object, leaving it orphaned");
                    report.failed.push(location);
                }
            }
        }

        info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Media cleanup finished"
        );
        report
    }
}
