//! Object storage access for backup files
//! Uses Apache Arrow object_store crate

use crate::config::{StorageConfig, StorageProvider};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::{ObjectStore, path::Path as StoragePath};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage is not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(#[from] object_store::path::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// A listed backup file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

/// Backup bucket client wrapping object_store
#[derive(Clone)]
pub struct BackupStore {
    store: Arc<dyn ObjectStore>,
    pub bucket: String,
}

impl BackupStore {
    /// Create new store client with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String) -> Self {
        Self { store, bucket }
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
            bucket: "backups".to_string(),
        }
    }

    /// Build a client for the configured provider.
    ///
    /// The S3 provider speaks to any S3-compatible server (MinIO included);
    /// plain `http://` endpoints are allowed.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.provider {
            StorageProvider::Local => {
                tracing::warn!(bucket = %config.bucket, "Using in-memory storage");
                Ok(Self::new(
                    Arc::new(object_store::memory::InMemory::new()),
                    config.bucket.clone(),
                ))
            }
            StorageProvider::S3 => {
                let server = config
                    .server
                    .as_deref()
                    .ok_or_else(|| StorageError::NotConfigured("server".to_string()))?;
                let s3 = s3_builder(config)?.build()?;

                tracing::info!(server, bucket = %config.bucket, "Connected to object storage");
                Ok(Self::new(Arc::new(s3), config.bucket.clone()))
            }
        }
    }

    /// List every object whose key starts with `prefix`
    pub async fn list(&self, prefix: &str) -> Result<Vec<BackupObject>> {
        // Flat listing; object_store prefixes match whole path segments only
        let objects: Vec<BackupObject> = self
            .store
            .list(None)
            .try_filter(|meta| futures::future::ready(meta.location.as_ref().starts_with(prefix)))
            .map_ok(|meta| BackupObject {
                key: meta.location.to_string(),
                last_modified: meta.last_modified,
                size: meta.size,
            })
            .try_collect()
            .await?;

        tracing::debug!(bucket = %self.bucket, count = objects.len(), "Listed objects");

        Ok(objects)
    }

    /// Upload bytes to storage
    pub async fn upload(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = StoragePath::from(key);
        let size = data.len();

        self.store.put(&path, data.into()).await?;

        tracing::info!(key, size, "Uploaded to storage");
        Ok(())
    }

    /// Remove an object by the key returned from [`BackupStore::list`]
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = StoragePath::parse(key)?;

        self.store.delete(&path).await?;

        tracing::debug!(key, "Deleted from storage");
        Ok(())
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::parse(key)?;

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Path-style S3 client settings for `config`; plain http only for `http://` servers
fn s3_builder(config: &StorageConfig) -> Result<AmazonS3Builder> {
    let server = config
        .server
        .as_deref()
        .ok_or_else(|| StorageError::NotConfigured("server".to_string()))?;
    let access_key = config
        .access_key
        .as_deref()
        .ok_or_else(|| StorageError::NotConfigured("access key".to_string()))?;
    let secret_key = config
        .secret_key
        .as_deref()
        .ok_or_else(|| StorageError::NotConfigured("secret key".to_string()))?;

    Ok(AmazonS3Builder::new()
        .with_endpoint(server)
        .with_allow_http(server.starts_with("http://"))
        .with_virtual_hosted_style_request(false)
        .with_region(&config.region)
        .with_bucket_name(&config.bucket)
        .with_access_key_id(access_key)
        .with_secret_access_key(secret_key))
}
