//! Storage configuration types.

use std::path::PathBuf;
use std::time::Duration;

use photostore_shared::StorageSettings;
use super::error::StoreError;

/// Storage provider configuration.
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// S3-compatible storage: MinIO, Cloudflare R2, AWS S3
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory (tests only)
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider (MinIO, Cloudflare R2, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "fs",
            Self::Memory => "memory",
        }
    }

    /// Get the bucket name, or its stand-in for non-bucket providers.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
            Self::Memory => "memory",
        }
    }
}

/// Client-side timeouts applied to every store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageTimeouts {
    /// Time allowed to establish a connection.
    pub connect: Duration,
    /// Time allowed to receive data.
    pub read: Duration,
    /// Time allowed to send data.
    pub write: Duration,
}

impl StorageTimeouts {
    /// Default for each timeout: 30 seconds.
    pub const DEFAULT: Duration = Duration::from_secs(30);

    /// Deadline for a whole non-streaming call (stat, delete, list, presign).
    #[must_use]
    pub fn operation(&self) -> Duration {
        self.connect + self.read
    }

    /// Deadline for a single chunk of a streaming read or write.
    #[must_use]
    pub fn io(&self) -> Duration {
        self.read.max(self.write)
    }
}

impl Default for StorageTimeouts {
    fn default() -> Self {
        Self {
            connect: Self::DEFAULT,
            read: Self::DEFAULT,
            write: Self::DEFAULT,
        }
    }
}

/// Storage adapter configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Client-side timeouts.
    pub timeouts: StorageTimeouts,
}

impl StorageConfig {
    /// Create a new storage config with default timeouts.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            timeouts: StorageTimeouts::default(),
        }
    }

    /// Set client-side timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: StorageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build the adapter configuration from loaded application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider is unknown or one of its
    /// required settings is missing.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StoreError> {
        let provider = match settings.provider.as_str() {
            "s3" => StorageProvider::s3(
                required(settings.endpoint.as_deref(), "storage.endpoint")?,
                required(Some(settings.bucket.as_str()), "storage.bucket")?,
                required(settings.access_key.as_deref(), "storage.access_key")?,
                required(settings.secret_key.as_deref(), "storage.secret_key")?,
                settings.region.as_str(),
            ),
            "fs" => StorageProvider::local_fs(required(settings.root.as_deref(), "storage.root")?),
            "memory" => StorageProvider::Memory,
            other => {
                return Err(StoreError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        let timeouts = StorageTimeouts {
            connect: Duration::from_millis(settings.connect_timeout_ms),
            read: Duration::from_millis(settings.read_timeout_ms),
            write: Duration::from_millis(settings.write_timeout_ms),
        };

        Ok(Self::new(provider).with_timeouts(timeouts))
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, StoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(StoreError::configuration(format!("{name} is required"))),
    }
}
