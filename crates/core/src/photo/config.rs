//! Photo service configuration.

use std::time::Duration;

use photostore_shared::UploadSettings;

/// Photo service configuration.
#[derive(Debug, Clone)]
pub struct PhotoServiceConfig {
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Allowed content types; `type/*` entries match a whole family.
    pub allowed_content_types: Vec<String>,
    /// Lifetime of the URL returned after upload.
    pub upload_url_ttl: Duration,
    /// Lifetime of the URL returned by info lookups.
    pub info_url_ttl: Duration,
}

impl PhotoServiceConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default upload URL TTL: 7 days.
    pub const DEFAULT_UPLOAD_URL_TTL: Duration = Duration::from_secs(7 * Self::SECS_PER_DAY);
    /// Default info URL TTL: 1 day.
    pub const DEFAULT_INFO_URL_TTL: Duration = Duration::from_secs(Self::SECS_PER_DAY);
    /// Longest presigned URL lifetime S3 accepts, in days.
    pub const MAX_URL_EXPIRY_DAYS: u32 = 7;
    /// Seconds in a day.
    pub const SECS_PER_DAY: u64 = 86_400;

    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_content_types: vec!["image/*".to_string()],
            upload_url_ttl: Self::DEFAULT_UPLOAD_URL_TTL,
            info_url_ttl: Self::DEFAULT_INFO_URL_TTL,
        }
    }

    /// Create a config from loaded upload settings.
    #[must_use]
    pub fn from_settings(settings: &UploadSettings) -> Self {
        Self::new()
            .with_max_file_size(settings.max_file_size)
            .with_allowed_content_types(settings.allowed_content_types.clone())
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set allowed content types.
    #[must_use]
    pub fn with_allowed_content_types(mut self, types: Vec<String>) -> Self {
        self.allowed_content_types = types;
        self
    }

    /// Check if a content type is allowed.
    ///
    /// Parameters such as `; charset=...` are ignored and matching is
    /// case-insensitive.
    #[must_use]
    pub fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.is_empty() {
            return false;
        }

        self.allowed_content_types.iter().any(|allowed| {
            let allowed = allowed.trim().to_ascii_lowercase();
            match allowed.strip_suffix('*') {
                Some(family) => essence
                    .strip_prefix(family)
                    .is_some_and(|subtype| !subtype.is_empty()),
                None => essence == allowed,
            }
        })
    }
}

impl Default for PhotoServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}
