//! Vector layer handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vector_catalog::DiscoveryReport;
use vector_common::{BoundsSummary, LayerSummary};

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LayerListResponse {
    pub layers: Vec<LayerSummary>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct LayerQuery {
    /// Douglas-Peucker tolerance in degrees
    pub simplify: Option<f64>,
}

/// GET /api/vector/layers - metadata for every catalog entry
pub async fn list_layers_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<LayerListResponse>, ApiError> {
    counter!("vector_api_requests_total", "endpoint" => "layers").increment(1);

    let layers = state.catalog.list_layers().await?;
    Ok(Json(LayerListResponse {
        count: layers.len(),
        layers,
    }))
}

/// GET /api/vector/layer/*identifier - GeoJSON for one layer
///
/// The identifier is either the display name or `source_file/layer_name`.
pub async fn layer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(identifier): Path<String>,
    Query(query): Query<LayerQuery>,
) -> Result<Response, ApiError> {
    counter!("vector_api_requests_total", "endpoint" => "layer").increment(1);

    match state
        .catalog
        .resolve_and_serve(&identifier, query.simplify)
        .await
    {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, "application/geo+json")],
            bytes,
        )
            .into_response()),
        Err(e) => {
            if e.http_status_code() >= 500 {
                warn!(error = %e, "Vector layer request failed");
            }
            Err(e.into())
        }
    }
}

/// GET /api/vector/bounds - extent of every loaded layer (`null` before any load)
pub async fn bounds_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Option<BoundsSummary>>, ApiError> {
    Ok(Json(state.catalog.bounds_summary().await?))
}

/// POST /api/vector/reload - re-run discovery
pub async fn reload_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<DiscoveryReport>, ApiError> {
    let report = state.catalog.reload().await?;
    info!(layers = report.layers, "Catalog reloaded via API");
    Ok(Json(report))
}
