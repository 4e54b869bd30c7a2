//! Geometry source abstraction.
//!
//! The catalog talks to container files only through [`GeometrySource`], so
//! tests can substitute an in-memory or instrumented source.

use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;
use geo_types::Geometry;
use serde_json::{Map, Value};

use vector_common::{CrsCode, GeometryKind, VectorError, VectorResult};

/// Layer metadata as listed by a source, before any merging.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLayer {
    pub name: String,
    pub kind: GeometryKind,
    /// Declared CRS; `None` when the container's CRS has no EPSG code
    pub crs: Option<CrsCode>,
}

/// One raw feature in its source CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    pub id: i64,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

/// Reads layer listings and raw features from container files.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Enumerate the layers of a container without materializing geometry.
    ///
    /// Fails with [`VectorError::SourceRead`] when the file cannot be opened
    /// or holds no layers.
    async fn list_layers(&self, path: &Path) -> VectorResult<Vec<SourceLayer>>;

    /// Read every feature of one layer.
    async fn read_layer(&self, path: &Path, layer: &str) -> VectorResult<Vec<SourceFeature>>;

    /// Last modification time of a container, used for staleness checks.
    async fn modified(&self, path: &Path) -> VectorResult<SystemTime> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| VectorError::source_read(file_label(path), e.kind()))?;
        metadata
            .modified()
            .map_err(|e| VectorError::source_read(file_label(path), e.kind()))
    }
}

/// File name component of a path, for error messages that must not leak directories.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// GeoPackage-backed source.
#[derive(Debug, Clone, Default)]
pub struct GpkgSource;

impl GpkgSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GeometrySource for GpkgSource {
    async fn list_layers(&self, path: &Path) -> VectorResult<Vec<SourceLayer>> {
        let layers = gpkg_reader::list_layers(path)
            .await
            .map_err(|e| VectorError::source_read(file_label(path), e))?;

        Ok(layers
            .into_iter()
            .map(|l| SourceLayer {
                name: l.name,
                kind: l.kind,
                crs: l.crs,
            })
            .collect())
    }

    async fn read_layer(&self, path: &Path, layer: &str) -> VectorResult<Vec<SourceFeature>> {
        let (_, features) = gpkg_reader::read_layer(path, layer)
            .await
            .map_err(|e| VectorError::source_read(file_label(path), e))?;

        Ok(features
            .into_iter()
            .map(|f| SourceFeature {
                id: f.id,
                geometry: f.geometry,
                properties: f.properties,
            })
            .collect())
    }
}
