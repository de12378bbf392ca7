//! HTTP API layer with Axum routes for product photos.
//!
//! This crate provides:
//! - REST API routes
//! - Error responses
//! - Shared application state

pub mod error;
pub mod routes;

use axum::Router;
use photostore_core::photo::PhotoService;
use photostore_core::storage::StorageService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Photo use cases.
    pub photos: Arc<PhotoService<StorageService>>,
    /// Object store adapter, for provider details.
    pub storage: Arc<StorageService>,
}

impl AppState {
    /// Create state sharing one storage adapter between the photo service
    /// and the health endpoint.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, photos: PhotoService<StorageService>) -> Self {
        Self {
            photos: Arc::new(photos),
            storage,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
