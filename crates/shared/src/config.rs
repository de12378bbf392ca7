//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
    /// Upload limits.
    #[serde(default)]
    pub upload: UploadSettings,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Object storage settings as read from config files and environment.
///
/// `provider` selects the backend: `s3` (any S3-compatible endpoint such as
/// MinIO), `fs` (local directory under `root`) or `memory`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend name.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// S3 access key.
    #[serde(default)]
    pub access_key: Option<String>,
    /// S3 secret key.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Bucket holding all photos.
    pub bucket: String,
    /// S3 region. MinIO accepts any value.
    #[serde(default = "default_region")]
    pub region: String,
    /// Root directory for the `fs` provider.
    #[serde(default)]
    pub root: Option<String>,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Write timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,
}

fn default_provider() -> String {
    "s3".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Upload limits.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Accepted content types; `image/*` style wildcards are allowed.
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_content_types() -> Vec<String> {
    vec!["image/*".to_string()]
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `PHOTOSTORE__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PHOTOSTORE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
