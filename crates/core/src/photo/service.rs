//! Photo service implementation.

use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use photostore_shared::types::{FileId, ProductId};
use tracing::{debug, info, warn};

use super::config::PhotoServiceConfig;
use super::error::PhotoError;
use super::naming::PhotoKey;
use super::types::{DEFAULT_CONTENT_TYPE, PhotoContent, PhotoRecord, UploadPhotoInput, UploadedPhoto};
use crate::storage::{ObjectStore, PresignedUrl, StoreError};

/// Photo use cases over an object store.
///
/// Holds no state between calls; every read goes to the store.
pub struct PhotoService<S: ObjectStore> {
    store: Arc<S>,
    config: PhotoServiceConfig,
}

impl<S: ObjectStore> PhotoService<S> {
    /// Create a new photo service.
    #[must_use]
    pub fn new(store: Arc<S>, config: PhotoServiceConfig) -> Self {
        Self { store, config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &PhotoServiceConfig {
        &self.config
    }

    /// Validate an upload against size and content type limits.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the file is empty, too large, or not an
    /// allowed content type.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), PhotoError> {
        if !self.config.is_content_type_allowed(content_type) {
            return Err(PhotoError::validation(format!(
                "content type '{content_type}' is not allowed, only images are accepted"
            )));
        }

        if size == 0 {
            return Err(PhotoError::validation("file is empty"));
        }

        if size > self.config.max_file_size {
            return Err(PhotoError::validation(format!(
                "file size {size} bytes exceeds maximum allowed {} bytes",
                self.config.max_file_size
            )));
        }

        Ok(())
    }

    /// Store a new photo under `{product_id}/{file_id}.{ext}`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for rejected input, or a storage error if
    /// the write fails.
    pub async fn upload(&self, input: UploadPhotoInput) -> Result<UploadedPhoto, PhotoError> {
        self.validate_upload(&input.content_type, input.body.len() as u64)?;

        let file_id = input.file_id.unwrap_or_else(FileId::new);
        let key = PhotoKey::resolve(input.product_id, file_id, &input.original_file_name)?;
        let path = key.to_string();
        let size = input.body.len();

        self.store
            .put(&path, input.body, &input.content_type)
            .await
            .map_err(PhotoError::Storage)?;

        let url = self.presign_if_supported(&path, self.config.upload_url_ttl).await;

        info!(
            path = %path,
            product_id = %input.product_id,
            size,
            content_type = %input.content_type,
            "Photo uploaded"
        );

        Ok(UploadedPhoto {
            path,
            product_id: input.product_id,
            file_id,
            url,
        })
    }

    /// Delete a photo. Deleting a missing photo is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed path, or a storage error if
    /// existence cannot be determined or the delete fails.
    pub async fn delete(&self, path: &str) -> Result<(), PhotoError> {
        let key = PhotoKey::parse(path)?.to_string();

        let exists = self.store.exists(&key).await.map_err(PhotoError::Storage)?;
        if !exists {
            debug!(path = %key, "Delete requested for missing photo");
            return Ok(());
        }

        self.store.delete(&key).await.map_err(PhotoError::Storage)?;
        info!(path = %key, "Photo deleted");
        Ok(())
    }

    /// Open a photo for streaming.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the photo is absent, or a storage error for any
    /// other failure.
    pub async fn fetch(&self, path: &str) -> Result<PhotoContent, PhotoError> {
        let key = PhotoKey::parse(path)?;
        let metadata = self.store.stat(&key.to_string()).await?;
        let body = self.store.open(&metadata.key).await?;

        Ok(PhotoContent {
            file_name: key.file_name(),
            content_type: metadata
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size: metadata.size,
            last_modified: metadata.last_modified,
            body,
        })
    }

    /// Metadata of a photo with a short-lived download URL.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the photo is absent, or a storage error for any
    /// other failure.
    pub async fn info(&self, path: &str) -> Result<PhotoRecord, PhotoError> {
        let key = PhotoKey::parse(path)?;
        let metadata = self.store.stat(&key.to_string()).await?;
        let url = self
            .presign_if_supported(&metadata.key, self.config.info_url_ttl)
            .await;

        Ok(PhotoRecord::new(&key, metadata, url))
    }

    /// All photos of a product.
    ///
    /// Objects whose metadata cannot be read, or whose key is outside the
    /// naming scheme, are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the listing itself fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<PhotoRecord>, PhotoError> {
        let prefix = PhotoKey::product_prefix(product_id);
        let mut keys = self.store.list(&prefix).await.map_err(PhotoError::Storage)?;

        let mut records = Vec::new();
        while let Some(key) = keys.try_next().await.map_err(PhotoError::Storage)? {
            let photo = match PhotoKey::parse(&key) {
                Ok(photo) => photo,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping object outside naming scheme");
                    continue;
                }
            };

            match self.store.stat(&key).await {
                Ok(metadata) => records.push(PhotoRecord::new(&photo, metadata, None)),
                Err(e) => warn!(key = %key, error = %e, "Failed to get metadata, skipping"),
            }
        }

        Ok(records)
    }

    /// Presigned download URL valid for `expiry_days`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `expiry_days` is outside `1..=7`,
    /// `NotFound` if the photo is absent, or an internal error if the provider
    /// cannot presign.
    pub async fn presigned_url(
        &self,
        path: &str,
        expiry_days: u32,
    ) -> Result<PresignedUrl, PhotoError> {
        let max = PhotoServiceConfig::MAX_URL_EXPIRY_DAYS;
        if !(1..=max).contains(&expiry_days) {
            return Err(PhotoError::validation(format!(
                "expiryDays must be between 1 and {max}"
            )));
        }

        let key = PhotoKey::parse(path)?;
        let metadata = self.store.stat(&key.to_string()).await?;
        let expiry = Duration::from_secs(u64::from(expiry_days) * PhotoServiceConfig::SECS_PER_DAY);

        match self.store.presign_read(&metadata.key, expiry).await {
            Ok(url) => Ok(url),
            Err(StoreError::Unsupported(msg)) => Err(PhotoError::internal(format!(
                "presigned URLs are not available: {msg}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a photo exists.
    ///
    /// Paths outside the naming scheme never exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if existence cannot be determined.
    pub async fn exists(&self, path: &str) -> Result<bool, PhotoError> {
        let Ok(key) = PhotoKey::parse(path) else {
            return Ok(false);
        };

        self.store
            .exists(&key.to_string())
            .await
            .map_err(PhotoError::Storage)
    }

    /// Best-effort presign for upload and info responses.
    ///
    /// Unlike the store writes, a presign failure here is deliberately not an
    /// error: the photo is already stored or stat'ed, so the URL is logged
    /// and omitted. [`PhotoService::presigned_url`] is the strict variant.
    async fn presign_if_supported(&self, key: &str, ttl: Duration) -> Option<String> {
        match self.store.presign_read(key, ttl).await {
            Ok(presigned) => Some(presigned.url),
            Err(StoreError::Unsupported(msg)) => {
                debug!(key = %key, reason = %msg, "Presign unsupported, omitting URL");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to presign, omitting URL");
                None
            }
        }
    }
}
