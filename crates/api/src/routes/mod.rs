//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod files;
pub mod health;

/// Creates the API router with all routes.
///
/// The upload body limit is sized from the photo service configuration.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/files", files::routes(state.photos.config().max_file_size))
}
