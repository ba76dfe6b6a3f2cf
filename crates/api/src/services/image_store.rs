//! Photo URLs and photo bytes from the assets bucket.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use hanami_core::storage::{public_image_url, tree_object_key};

use crate::config::{ImageUrlMode, StorageConfig};

/// Errors from the object storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object key does not exist in the bucket.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The S3 request failed (network, credentials, throttling, etc.).
    #[error("S3 request failed: {0}")]
    Request(String),
}

/// Read access to stored photos.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// URL the browser can load the photo from. An empty key, or a URL that
    /// cannot be signed, yields an empty string.
    async fn image_url(&self, image_obj_key: &str) -> String;

    /// Raw bytes of a stored photo.
    async fn fetch(&self, image_obj_key: &str) -> Result<Vec<u8>, StorageError>;
}

/// [`ImageStore`] backed by the S3 assets bucket.
pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
    config: StorageConfig,
}

impl S3ImageStore {
    pub fn new(client: aws_sdk_s3::Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Build a client from the default AWS credential chain.
    pub async fn from_config(config: StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .load()
            .await;
        Self::new(aws_sdk_s3::Client::new(&sdk_config), config)
    }

    async fn presigned_url(&self, image_obj_key: &str) -> Result<String, StorageError> {
        let presigning =
            PresigningConfig::expires_in(Duration::from_secs(self.config.presign_expiry_secs))
                .map_err(|e| StorageError::Request(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.config.assets_bucket)
            .key(tree_object_key(image_obj_key))
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Request(DisplayErrorContext(&e).to_string()))?;
        Ok(request.uri().to_string())
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn image_url(&self, image_obj_key: &str) -> String {
        if image_obj_key.is_empty() {
            return String::new();
        }
        match self.config.url_mode {
            ImageUrlMode::Public => public_image_url(
                &self.config.assets_bucket,
                &self.config.region,
                image_obj_key,
            ),
            ImageUrlMode::Presigned => match self.presigned_url(image_obj_key).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(image_obj_key, error = %e, "Failed to presign image URL");
                    String::new()
                }
            },
        }
    }

    async fn fetch(&self, image_obj_key: &str) -> Result<Vec<u8>, StorageError> {
        let key = tree_object_key(image_obj_key);
        let output = self
            .client
            .get_object()
            .bucket(&self.config.assets_bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(key.clone())
                } else {
                    StorageError::Request(DisplayErrorContext(&e).to_string())
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?
            .into_bytes();

        tracing::debug!(key = %key, size = bytes.len(), "Fetched photo from S3");
        Ok(bytes.to_vec())
    }
}
