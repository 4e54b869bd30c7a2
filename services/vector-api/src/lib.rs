//! Vector layer API service library.
//!
//! Exposes the router and handlers so integration tests can drive the
//! service without binding a socket.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Vector layer endpoints
        .route("/api/vector/layers", get(handlers::layers::list_layers_handler))
        .route(
            "/api/vector/layer/*identifier",
            get(handlers::layers::layer_handler),
        )
        .route("/api/vector/bounds", get(handlers::layers::bounds_handler))
        .route("/api/vector/reload", post(handlers::layers::reload_handler))
        // Health check
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        // Metrics
        .route("/metrics", get(handlers::health::metrics_handler))
        .layer(Extension(state))
}
