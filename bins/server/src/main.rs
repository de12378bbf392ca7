//! Photostore API Server
//!
//! Main entry point for the product photo service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use photostore_api::{AppState, create_router};
use photostore_core::photo::{PhotoService, PhotoServiceConfig};
use photostore_core::storage::{StorageConfig, StorageService};
use photostore_shared::{AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.log);

    // Create storage adapter and make sure the bucket exists before accepting traffic
    let storage_config =
        StorageConfig::from_settings(&config.storage).context("Invalid storage configuration")?;
    let storage = Arc::new(
        StorageService::from_config(storage_config).context("Failed to create storage service")?,
    );
    storage
        .ensure_bucket()
        .await
        .with_context(|| format!("Bucket '{}' is not reachable", storage.bucket()))?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        "Storage configured"
    );

    // Create photo service
    let photo_config = PhotoServiceConfig::from_settings(&config.upload);
    info!(
        max_file_size = photo_config.max_file_size,
        allowed_content_types = ?photo_config.allowed_content_types,
        "Upload limits configured"
    );
    let photos = PhotoService::new(storage.clone(), photo_config);

    // Create router
    let app = create_router(AppState::new(storage, photos));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "photostore=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
