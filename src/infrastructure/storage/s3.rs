use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, info};
use url::Url;

use super::{ObjectStore, UploadUrlSigner};

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
}

impl StorageService {
    pub async fn new(endpoint: &str, bucket: &str, access_key: &str, secret_key: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!("✅ Connected to S3 (MinIO)");

        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    pub fn key_for(&self, location: &str) -> Result<String> {
        object_key(&self.bucket, location)
            .ok_or_else(|| anyhow!("{} is not an object in bucket {}", location, self.bucket))
    }

    /// Streams an object to `path` without buffering it in memory.
    pub async fn download_to_file(&self, key: &str, path: &Path) -> Result<u64> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch {}: {}", key, aws_sdk_s3::Error::from(e)))?;

        copy_to_file(result.body.into_async_read(), path)
            .await
            .map_err(|e| anyhow!("Failed to read {}: {}", key, e))
    }

    /// Uploads the file at `path`, streamed from disk.
    pub async fn upload_file(&self, key: &str, path: &Path, content_type: &str) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to upload {}: {}", key, aws_sdk_s3::Error::from(e)))?;
        Ok(())
    }

    pub async fn remove_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to delete {}: {}", key, aws_sdk_s3::Error::from(e)))?;
        Ok(())
    }
}

/// Copies `reader` into a freshly created file at `path`, returning the byte count.
pub async fn copy_to_file<R>(mut reader: R, path: &Path) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = File::create(path).await?;
    let written = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

/// Resolves a stored media location to an object key in `bucket`.
///
/// Accepts `s3://bucket/key`, path-style `http(s)://host/bucket/key`, or a
/// bare relative key as older catalog rows store it.
pub fn object_key(bucket: &str, location: &str) -> Option<String> {
    let key = match Url::parse(location) {
        Ok(url) if url.scheme() == "s3" => {
            if url.host_str() != Some(bucket) {
                return None;
            }
            url.path().trim_start_matches('/').to_string()
        }
        Ok(url) => {
            let path = url.path().trim_start_matches('/');
            path.strip_prefix(bucket)?.strip_prefix('/')?.to_string()
        }
        Err(_) => location.trim_start_matches('/').to_string(),
    };

    (!key.is_empty()).then_some(key)
}

#[async_trait]
impl UploadUrlSigner for StorageService {
    fn object_url(&self, key: &str) -> String {
        self.url_for(key)
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| anyhow!("Invalid presign expiry: {}", e))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(config)
            .await
            .map_err(|e| anyhow!("Failed to presign upload: {}", aws_sdk_s3::Error::from(e)))?;

        Ok(request.uri().to_string())
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn delete_object(&self, location: &str) -> Result<()> {
        let key = self.key_for(location)?;
        debug!(key = %key, "Deleting object");
        self.remove_object(&key).await
    }
}
