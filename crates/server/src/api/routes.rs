use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{downloads, handlers, metrics};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Download jobs
        .route("/download", post(downloads::create_download))
        .route("/download/{id}", delete(downloads::cancel_download))
        .route("/progress/{id}", get(downloads::get_progress))
        .route("/downloaded/{id}", get(downloads::get_file))
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(metrics::get_metrics))
        // The browser frontend is served elsewhere; every route is cross-origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
