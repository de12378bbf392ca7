//! Object store adapter using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: MinIO, Cloudflare R2, AWS S3
//! - Local filesystem (development only)
//! - In-process memory (tests only)
//!
//! Missing S3 buckets are created once at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ObjectStore (trait)                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ put / delete / exists      │ stat / open                        │
//! │ list (non-recursive)       │ presign_read                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │              StorageService (Apache OpenDAL Operator)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod bucket;
mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider, StorageTimeouts};
pub use error::StoreError;
pub use service::{
    ByteStream, KeyStream, ObjectMetadata, ObjectStore, PresignedUrl, StorageService,
};
