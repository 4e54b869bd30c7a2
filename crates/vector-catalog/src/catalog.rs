//! The layer catalog: discovery, reload and the serving entry points.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{info, warn};
use walkdir::WalkDir;

use vector_common::{
    display_name, BoundsSummary, LayerKey, LayerStatus, LayerSummary, VectorError, VectorResult,
    MERGED_LAYER_NAME,
};

use crate::cache::{CacheStats, CacheStatsSnapshot, LayerSlot};
use crate::config::EngineConfig;
use crate::layer::LayerDescriptor;
use crate::loader;
use crate::merge::{EntryPlan, MergePolicy};
use crate::resolver::CatalogIndex;
use crate::source::{file_label, GeometrySource};

/// Outcome of one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DiscoveryReport {
    /// Container files found in the data directory
    pub files: usize,
    /// Files skipped because they could not be read
    pub failed_files: usize,
    /// Catalog entries after merging
    pub layers: usize,
    /// Entries whose loaded cache was carried over from the previous index
    pub reused: usize,
    /// Entries created unavailable because a member CRS cannot be normalized
    pub unavailable: usize,
}

/// One process-local catalog of vector layers and their caches.
///
/// Construct it, then call [`Catalog::discover`]; until discovery completes
/// every resolution fails with [`VectorError::CatalogNotReady`].
pub struct Catalog {
    config: EngineConfig,
    policy: MergePolicy,
    source: Arc<dyn GeometrySource>,
    index: RwLock<Option<Arc<CatalogIndex>>>,
    stats: Arc<CacheStats>,
}

impl Catalog {
    pub fn new(config: EngineConfig, source: Arc<dyn GeometrySource>) -> Self {
        let policy = MergePolicy::from_config(&config);
        Self {
            config,
            policy,
            source,
            index: RwLock::new(None),
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Share of requests served without a load, in percent.
    pub fn hit_rate(&self) -> f64 {
        self.stats.hit_rate()
    }

    pub async fn is_ready(&self) -> bool {
        self.index.read().await.is_some()
    }

    async fn current(&self) -> VectorResult<Arc<CatalogIndex>> {
        self.index
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(VectorError::CatalogNotReady)
    }

    /// Run discovery and publish the resulting index.
    ///
    /// Fails only when the data directory itself cannot be enumerated;
    /// unreadable files are logged and skipped.
    pub async fn discover(&self) -> VectorResult<DiscoveryReport> {
        self.rebuild().await
    }

    /// Re-run discovery.
    ///
    /// In-flight resolutions keep the index they started with. Entries whose
    /// descriptor is unchanged keep their slot (and any cached payload);
    /// unavailable entries start over as discovered unless their CRS still
    /// cannot be normalized.
    pub async fn reload(&self) -> VectorResult<DiscoveryReport> {
        info!("Reloading vector layer catalog");
        self.rebuild().await
    }

    async fn rebuild(&self) -> VectorResult<DiscoveryReport> {
        let start = Instant::now();
        let files = self.scan_data_dir().await?;

        let mut descriptors = Vec::new();
        let mut failed_files = 0;
        for path in &files {
            match self.discover_file(path).await {
                Ok(found) => descriptors.extend(found),
                Err(e) => {
                    failed_files += 1;
                    warn!(file = %file_label(path), error = %e, "Skipping unreadable container");
                }
            }
        }

        let reusable = self.reusable_slots().await;
        let mut reused = 0;
        let mut unavailable = 0;
        let index = CatalogIndex::build(descriptors, |descriptor| {
            if let Err(e) = loader::check_members(&descriptor) {
                unavailable += 1;
                warn!(
                    layer = %descriptor.key,
                    error = %e,
                    "Layer CRS cannot be normalized; marking unavailable"
                );
                return Arc::new(LayerSlot::unavailable(
                    descriptor,
                    Arc::clone(&self.source),
                    Arc::clone(&self.stats),
                    e.to_string(),
                ));
            }
            match reusable.get(&descriptor.key.compound()) {
                Some(slot) if *slot.descriptor() == descriptor => {
                    reused += 1;
                    Arc::clone(slot)
                }
                _ => Arc::new(
                    LayerSlot::new(descriptor, Arc::clone(&self.source), Arc::clone(&self.stats))
                        .with_max_variants(self.config.max_simplify_variants),
                ),
            }
        });

        let report = DiscoveryReport {
            files: files.len(),
            failed_files,
            layers: index.len(),
            reused,
            unavailable,
        };
        *self.index.write().await = Some(Arc::new(index));

        info!(
            files = report.files,
            failed_files = report.failed_files,
            layers = report.layers,
            reused = report.reused,
            unavailable = report.unavailable,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Vector layer discovery complete"
        );
        Ok(report)
    }

    /// Slots of the previous index that a rebuild may keep.
    async fn reusable_slots(&self) -> HashMap<String, Arc<LayerSlot>> {
        let Some(previous) = self.index.read().await.as_ref().map(Arc::clone) else {
            return HashMap::new();
        };
        let mut slots = HashMap::new();
        for slot in previous.entries() {
            if slot.is_reusable().await {
                slots.insert(slot.descriptor().key.compound(), Arc::clone(slot));
            }
        }
        slots
    }

    /// Container files directly inside the data directory, in name order.
    async fn scan_data_dir(&self) -> VectorResult<Vec<PathBuf>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || scan_dir(&config))
            .await
            .map_err(|e| VectorError::Internal(format!("directory scan failed: {}", e)))?
    }

    async fn discover_file(&self, path: &Path) -> VectorResult<Vec<LayerDescriptor>> {
        let source_file = file_label(path);
        let layers = self.source.list_layers(path).await?;
        if layers.is_empty() {
            return Err(VectorError::source_read(&source_file, "container holds no layers"));
        }

        let descriptors = self
            .policy
            .plan(&source_file, layers)
            .into_iter()
            .map(|plan| {
                let (layer_name, kind, members, merged) = match plan {
                    EntryPlan::Single(layer) => {
                        (layer.name.clone(), layer.kind, vec![layer], false)
                    }
                    EntryPlan::Merged { kind, members } => {
                        (MERGED_LAYER_NAME.to_string(), kind, members, true)
                    }
                };
                let key = LayerKey::new(&source_file, layer_name);
                LayerDescriptor {
                    display_name: display_name(key.file_stem(), &key.layer_name),
                    key,
                    path: path.to_path_buf(),
                    kind,
                    members,
                    merged,
                }
            })
            .collect();
        Ok(descriptors)
    }

    /// Metadata-only listing in discovery order.
    pub async fn list_layers(&self) -> VectorResult<Vec<LayerSummary>> {
        let index = self.current().await?;
        let mut layers = Vec::with_capacity(index.len());
        for slot in index.entries() {
            layers.push(slot.summary().await);
        }
        Ok(layers)
    }

    /// Aggregate extent over loaded layers; `None` when nothing is loaded yet.
    pub async fn bounds_summary(&self) -> VectorResult<Option<BoundsSummary>> {
        let index = self.current().await?;
        let mut bounds = Vec::new();
        for slot in index.entries() {
            if let Some(b) = slot.cached().await.and_then(|layer| layer.bounds()) {
                bounds.push(b);
            }
        }
        Ok(BoundsSummary::from_bounds(&bounds))
    }

    /// Resolve a client identifier to its cache slot.
    pub async fn resolve(&self, identifier: &str) -> VectorResult<Arc<LayerSlot>> {
        let index = self.current().await?;
        index.resolve(identifier).map(Arc::clone)
    }

    /// Main read path: resolve, load once, return GeoJSON bytes.
    pub async fn resolve_and_serve(
        &self,
        identifier: &str,
        simplify: Option<f64>,
    ) -> VectorResult<Bytes> {
        let slot = self.resolve(identifier).await?;
        let tolerance = simplify.or(self.config.default_simplify_tolerance);
        slot.serve(tolerance).await
    }

    /// Count of entries per status, for readiness reporting.
    pub async fn status_counts(&self) -> VectorResult<HashMap<LayerStatus, usize>> {
        let index = self.current().await?;
        let mut counts = HashMap::new();
        for slot in index.entries() {
            *counts.entry(slot.status().await).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

fn scan_dir(config: &EngineConfig) -> VectorResult<Vec<PathBuf>> {
    let root = &config.data_dir;
    std::fs::read_dir(root)
        .map_err(|e| VectorError::Discovery(format!("data directory is not readable: {}", e.kind())))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy();
        if entry.path().is_file() && config.matches_extension(&name) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.gpkg", "a.GPKG", "notes.txt", "c.gpkg.bak"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.gpkg")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("deep.gpkg"), b"x").unwrap();

        let config = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let files = scan_dir(&config).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_label(p)).collect();
        assert_eq!(names, vec!["a.GPKG", "b.gpkg"]);
    }

    #[test]
    fn test_missing_data_dir_is_fatal_without_path() {
        let config = EngineConfig {
            data_dir: PathBuf::from("/nonexistent/secret/vector"),
            ..Default::default()
        };
        let err = scan_dir(&config).unwrap_err();
        assert!(matches!(err, VectorError::Discovery(_)));
        assert!(!err.to_string().contains("secret"));
    }
}
