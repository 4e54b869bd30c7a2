//! HTTP handlers.
//!
//! - `layers` - layer listing, GeoJSON serving, bounds and reload
//! - `health` - health, readiness and Prometheus metrics

pub mod health;
pub mod layers;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use vector_common::VectorError;

/// Engine error rendered as `{"error": "..."}` with the mapped status.
#[derive(Debug)]
pub struct ApiError(pub VectorError);

impl From<VectorError> for ApiError {
    fn from(err: VectorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        error_response(status, &self.0.to_string())
    }
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({
        "error": message
    });
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}
