use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{error, info};

use crate::config::StorageConfig;
use crate::error::{EtlError, Result};
use crate::services::sinks::ObjectStore;

/// [`ObjectStore`] writing into a single S3 bucket.
///
/// Credentials come from the ambient AWS configuration (env vars, instance
/// profile, etc.).
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: Option<String>,
}

impl S3Store {
    pub fn new(config: &aws_config::SdkConfig, storage: &StorageConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: storage.bucket.clone(),
        }
    }

    pub async fn from_env(storage: &StorageConfig) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(&config, storage)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        let bucket = self
            .bucket
            .as_deref()
            .ok_or(EtlError::CredentialMissing("S3_BUCKET_NAME"))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(bucket, key, error = %e, "Error uploading object to S3");
                EtlError::Upload {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            })?;

        info!(bucket, key, "Object uploaded to S3");
        Ok(())
    }
}
