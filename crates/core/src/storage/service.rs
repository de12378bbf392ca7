//! Object store adapter implementation using Apache OpenDAL.

use std::future::{self, Future};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use opendal::layers::TimeoutLayer;
use opendal::{Builder, ErrorKind, Operator, services};

use tracing::{info, warn};

use super::bucket::{self, BucketSetup};
use super::config::{StorageConfig, StorageProvider, StorageTimeouts};
use super::error::StoreError;

/// Streamed object body.
pub type ByteStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// Lazily listed object keys.
pub type KeyStream = BoxStream<'static, Result<String, StoreError>>;

/// Metadata of a stored object, fetched fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Storage key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Content type recorded at upload, if the provider keeps one.
    pub content_type: Option<String>,
    /// Last modification time, if the provider reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Presigned GET URL.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
}

/// Narrow interface over the object store primitives.
///
/// All keys live in the single configured bucket.
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`.
    fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// `Ok(false)` only when the store reports the key as not found.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Fetch object metadata.
    fn stat(&self, key: &str) -> impl Future<Output = Result<ObjectMetadata, StoreError>> + Send;

    /// Open the object body as a stream.
    fn open(&self, key: &str) -> impl Future<Output = Result<ByteStream, StoreError>> + Send;

    /// List the immediate children of `prefix`; nested keys are not returned.
    fn list(&self, prefix: &str) -> impl Future<Output = Result<KeyStream, StoreError>> + Send;

    /// Generate a presigned GET URL valid for `expiry`.
    fn presign_read(
        &self,
        key: &str,
        expiry: Duration,
    ) -> impl Future<Output = Result<PresignedUrl, StoreError>> + Send;
}

/// OpenDAL-backed object store.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StoreError> {
        let operator = Self::create_operator(&config)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(config: &StorageConfig) -> Result<Operator, StoreError> {
        match &config.provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                build_operator(builder, &config.timeouts)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StoreError::configuration("invalid path"))?,
                );

                build_operator(builder, &config.timeouts)
            }
            StorageProvider::Memory => {
                build_operator(services::Memory::default(), &config.timeouts)
            }
        }
    }

    /// Verify the bucket is reachable. Run once at startup.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bucket does not exist, or the underlying
    /// failure if it cannot be reached.
    pub async fn check(&self) -> Result<(), StoreError> {
        self.operator
            .check()
            .await
            .map_err(|e| StoreError::from_opendal(&e, self.bucket()))
    }

    /// Verify the bucket and create it if the store reports it missing.
    ///
    /// Only S3-compatible providers are created; every other failure is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the check failure, or the creation failure for S3.
    pub async fn ensure_bucket(&self) -> Result<(), StoreError> {
        match bucket::plan_setup(&self.config.provider, self.check().await)? {
            BucketSetup::Ready => Ok(()),
            BucketSetup::Create => {
                warn!("Bucket {} does not exist. Creating...", self.bucket());
                bucket::create_s3_bucket(&self.config).await?;
                info!("Bucket {} created", self.bucket());
                Ok(())
            }
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    fn supports_content_type(&self) -> bool {
        self.operator
            .info()
            .full_capability()
            .write_with_content_type
    }
}

impl ObjectStore for StorageService {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        let mut write = self.operator.write_with(key, body);
        // The fs provider has no place to keep a content type.
        if self.supports_content_type() {
            write = write.content_type(content_type);
        }
        write.await.map_err(|e| StoreError::from_opendal(&e, key))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StoreError::from_opendal(&e, key))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::from_opendal(&e, key)),
        }
    }

    async fn stat(&self, key: &str) -> Result<ObjectMetadata, StoreError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StoreError::from_opendal(&e, key))?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
            last_modified: meta.last_modified().and_then(parse_timestamp),
        })
    }

    async fn open(&self, key: &str) -> Result<ByteStream, StoreError> {
        let stream = self
            .operator
            .reader(key)
            .await
            .map_err(|e| StoreError::from_opendal(&e, key))?
            .into_bytes_stream(..)
            .await
            .map_err(|e| StoreError::from_opendal(&e, key))?;

        let key = key.to_string();
        Ok(stream
            .map_err(move |e| StoreError::operation(format!("{key}: {e}")))
            .boxed())
    }

    async fn list(&self, prefix: &str) -> Result<KeyStream, StoreError> {
        let lister = self
            .operator
            .lister(prefix)
            .await
            .map_err(|e| StoreError::from_opendal(&e, prefix))?;

        let prefix = prefix.to_string();
        Ok(lister
            .try_filter_map(|entry| {
                // Sub-directories are reported as entries; only objects count.
                let key = entry
                    .metadata()
                    .is_file()
                    .then(|| entry.path().to_string());
                future::ready(Ok(key))
            })
            .map_err(move |e| StoreError::from_opendal(&e, &prefix))
            .boxed())
    }

    async fn presign_read(&self, key: &str, expiry: Duration) -> Result<PresignedUrl, StoreError> {
        let presigned = self
            .operator
            .presign_read(key, expiry)
            .await
            .map_err(|e| StoreError::from_opendal(&e, key))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
        })
    }
}

fn build_operator(builder: impl Builder, timeouts: &StorageTimeouts) -> Result<Operator, StoreError> {
    let layer = TimeoutLayer::new()
        .with_timeout(timeouts.operation())
        .with_io_timeout(timeouts.io());

    Ok(Operator::new(builder)
        .map_err(|e| StoreError::configuration(e.to_string()))?
        .layer(layer)
        .finish())
}

/// OpenDAL renders timestamps in an RFC 3339 compatible form.
fn parse_timestamp(value: impl std::fmt::Display) -> Option<DateTime<Utc>> {
    value.to_string().parse().ok()
}
