//! Application state and shared resources.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use vector_catalog::{Catalog, EngineConfig, GpkgSource};

/// Shared application state.
pub struct AppState {
    /// Process-local layer catalog and caches.
    pub catalog: Arc<Catalog>,

    /// Prometheus recorder handle; absent when no recorder was installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Validate `config` and build an undiscovered catalog over GeoPackage files.
    pub fn new(config: EngineConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("invalid vector configuration: {}", e))?;

        let catalog = Catalog::new(config, Arc::new(GpkgSource::new()));
        Ok(Self {
            catalog: Arc::new(catalog),
            prometheus,
        })
    }
}
