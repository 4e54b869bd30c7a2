//! Health and metrics handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use vector_catalog::CacheStatsSnapshot;
use vector_common::LayerStatus;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<usize>,
    pub cache: CacheStatsSnapshot,
    pub cache_hit_rate: f64,
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /ready - 503 until the first discovery run has finished
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let response = match state.catalog.status_counts().await {
        Ok(counts) => ReadyResponse {
            ready: true,
            layers: Some(counts.values().sum()),
            unavailable: Some(counts.get(&LayerStatus::Unavailable).copied().unwrap_or(0)),
            cache: state.catalog.stats(),
            cache_hit_rate: state.catalog.hit_rate(),
        },
        Err(_) => ReadyResponse {
            ready: false,
            layers: None,
            unavailable: None,
            cache: state.catalog.stats(),
            cache_hit_rate: state.catalog.hit_rate(),
        },
    };

    let status = if response.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response)).into_response()
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
