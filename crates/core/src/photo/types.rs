//! Photo types and data structures.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use photostore_shared::types::{FileId, ProductId};
use serde::Serialize;

use super::naming::PhotoKey;
use crate::storage::{ByteStream, ObjectMetadata};

/// Content type reported when the store kept none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Input for uploading a photo.
#[derive(Debug, Clone)]
pub struct UploadPhotoInput {
    /// Owning product.
    pub product_id: ProductId,
    /// Caller-chosen file id; a fresh one is generated when absent.
    pub file_id: Option<FileId>,
    /// File name as sent by the client, used for its extension.
    pub original_file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// File contents.
    pub body: Bytes,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPhoto {
    /// Object key the photo was stored under.
    pub path: String,
    /// Owning product.
    pub product_id: ProductId,
    /// Stored file id.
    pub file_id: FileId,
    /// Presigned download URL, when the provider can presign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Metadata view of a stored photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    /// Object key.
    pub path: String,
    /// Owning product.
    pub product_id: ProductId,
    /// Last path segment.
    pub file_name: String,
    /// Stored content type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// Short-lived presigned download URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PhotoRecord {
    /// Build a record from a parsed key and fresh store metadata.
    #[must_use]
    pub fn new(key: &PhotoKey, metadata: ObjectMetadata, url: Option<String>) -> Self {
        Self {
            path: key.to_string(),
            product_id: key.product_id(),
            file_name: key.file_name(),
            content_type: metadata
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size: metadata.size,
            last_modified: metadata.last_modified,
            url,
        }
    }
}

/// A photo opened for streaming to the client.
///
/// Dropping it releases the underlying store connection.
pub struct PhotoContent {
    /// Last path segment.
    pub file_name: String,
    /// Stored content type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// Object body.
    pub body: ByteStream,
}

impl fmt::Debug for PhotoContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoContent")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_record_serializes_camel_case() {
        let key = PhotoKey::resolve(
            ProductId::from_uuid(Uuid::nil()),
            FileId::from_uuid(Uuid::max()),
            "shot.png",
        )
        .expect("valid name");
        let record = PhotoRecord::new(
            &key,
            ObjectMetadata {
                key: key.to_string(),
                size: 42,
                content_type: None,
                last_modified: None,
            },
            None,
        );

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["productId"], Uuid::nil().to_string());
        assert_eq!(json["fileName"], format!("{}.png", Uuid::max()));
        assert_eq!(json["contentType"], DEFAULT_CONTENT_TYPE);
        assert_eq!(json["size"], 42);
        assert!(json.get("url").is_none());
    }
}
