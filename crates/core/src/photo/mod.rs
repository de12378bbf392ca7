//! Photo service for product image assets.
//!
//! This module provides business logic for product photos including:
//! - Object key resolution from product id, file id and file name
//! - Upload validation and storage
//! - Streaming, metadata and presigned URL lookups
//! - Idempotent deletion

mod config;
mod error;
mod naming;
mod service;
mod types;

pub use config::PhotoServiceConfig;
pub use error::PhotoError;
pub use naming::{NamingError, PhotoKey};
pub use service::PhotoService;
pub use types::{DEFAULT_CONTENT_TYPE, PhotoContent, PhotoRecord, UploadPhotoInput, UploadedPhoto};
