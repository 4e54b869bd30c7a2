//! Error types for GeoPackage reading.

use thiserror::Error;

pub type GpkgResult<T> = Result<T, GpkgError>;

#[derive(Debug, Error)]
pub enum GpkgError {
    #[error("Cannot open container: {0}")]
    Open(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Container has no feature layers")]
    NoLayers,

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Invalid geometry blob: {0}")]
    InvalidGeometry(String),

    #[error("Unsupported WKB geometry type: {0}")]
    UnsupportedGeometryType(u32),
}

impl GpkgError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GpkgError::InvalidGeometry(reason.into())
    }
}
