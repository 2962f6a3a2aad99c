use async_trait::async_trait;
use std::time::Duration;

pub mod s3;

/// Issues the URLs a client uploads to directly.
#[async_trait]
pub trait UploadUrlSigner: Send + Sync {
    /// Canonical location recorded on the job and reported back by the client.
    fn object_url(&self, key: &str) -> String;

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn delete_object(&self, location: &str) -> anyhow::Result<()>;
}
