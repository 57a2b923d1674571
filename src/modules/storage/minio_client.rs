//! MinIO/S3-compatible blob storage adapter
//!
//! Uses the rust-s3 crate. Every key is placed under the configured document
//! prefix so the bucket can be shared with other services.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::{normalize_key, BlobStorage, StoredBlob};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    document_prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    pub fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Storage(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            document_prefix: config.document_prefix.trim_matches('/').to_string(),
        })
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        let created = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => info!("Bucket '{}' created", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}' at {}: {}. Assuming it exists.",
                        self.bucket.name(),
                        self.endpoint,
                        e
                    );
                }
            }
        }

        Ok(())
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Full object key for a relative document path
    fn object_key(&self, path: &str) -> Result<String> {
        let relative = normalize_key(path)?;
        if self.document_prefix.is_empty() {
            Ok(relative)
        } else {
            Ok(format!("{}/{}", self.document_prefix, relative))
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self.bucket.head_object(key).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("404") || error_str.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to check if file '{}' exists: {}",
                        key, e
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl BlobStorage for MinIOClient {
    async fn save(&self, key: &str, data: Vec<u8>, mime: &str) -> Result<StoredBlob> {
        let object_key = self.object_key(key)?;
        let size = data.len() as i64;

        self.bucket
            .put_object_with_content_type(&object_key, &data, mime)
            .await
            .map_err(|e| {
                AppError::Storage(format!("Failed to upload file '{}': {}", object_key, e))
            })?;

        debug!(
            "Uploaded file '{}' ({} bytes) to bucket '{}'",
            object_key,
            size,
            self.bucket.name()
        );

        Ok(StoredBlob {
            path: normalize_key(key)?,
            size,
            mime: mime.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let object_key = self.object_key(path)?;

        if !self.exists(&object_key).await? {
            return Ok(false);
        }

        self.bucket.delete_object(&object_key).await.map_err(|e| {
            AppError::Storage(format!("Failed to delete file '{}': {}", object_key, e))
        })?;

        debug!("Deleted file '{}' from bucket '{}'", object_key, self.bucket.name());
        Ok(true)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let object_key = self.object_key(path)?;

        let response = self.bucket.get_object(&object_key).await.map_err(|e| {
            AppError::Storage(format!("Failed to download file '{}': {}", object_key, e))
        })?;

        Ok(response.to_vec())
    }
}
