//! Two-tier layer cache with single-flight loading.
//!
//! Every catalog entry owns a [`LayerSlot`]. The slot's state machine is
//! guarded by an async mutex; the first caller that finds the slot cold (or
//! stale) installs a broadcast channel and spawns the load, and every later
//! caller subscribes to that channel instead of reading the file again.
//!
//! ```text
//! Request A ─┐                               spawned load task
//! Request B ─┼──► LayerSlot (Loading) ──────► read + reproject + serialize
//! Request C ─┘         ▲                              │
//!                      └──── broadcast result ────────┘
//! ```
//!
//! The load runs on its own task, so a caller that stops waiting (client
//! disconnect) does not cancel it. Payloads are swapped as whole `Arc`s and
//! never mutated, so a reader holding an old payload is unaffected by a
//! reload.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use lru::LruCache;
use metrics::{counter, histogram};
use tokio::sync::{broadcast, Mutex, OnceCell};
use tracing::{debug, info, warn};

use vector_common::{
    BoundingBox, CrsCode, LayerStatus, LayerStyle, LayerSummary, VectorError, VectorResult,
};

use crate::geojson;
use crate::layer::{LayerDescriptor, LayerMetadata, ParsedLayer};
use crate::loader;
use crate::source::GeometrySource;

type LoadOutcome = Result<Arc<LoadedLayer>, VectorError>;

/// Simplified variants kept per loaded layer unless configured otherwise.
pub const DEFAULT_MAX_VARIANTS: usize = 50;

/// Statistics for the layer cache.
///
/// All fields are atomic for lock-free reads from metrics endpoints.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Requests served from an already loaded entry
    pub hits: AtomicU64,
    /// Requests that started a load
    pub misses: AtomicU64,
    /// Loads that completed successfully
    pub loads: AtomicU64,
    /// Requests that waited on another caller's load
    pub coalesced: AtomicU64,
    /// Loads that failed and left the entry unavailable
    pub failures: AtomicU64,
    /// Simplified variants dropped to stay under the per-layer cap
    pub variant_evictions: AtomicU64,
}

impl CacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            variant_evictions: self.variant_evictions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub coalesced: u64,
    pub failures: u64,
    pub variant_evictions: u64,
}

/// Both cache tiers of one loaded entry.
pub struct LoadedLayer {
    /// Tier 1
    pub parsed: Arc<ParsedLayer>,
    pub metadata: Arc<LayerMetadata>,
    /// Tier 2, unsimplified
    pub geojson: Bytes,
    /// Tier 2, simplified variants keyed by tolerance bits, least recently
    /// used first out
    variants: Mutex<LruCache<u64, Arc<OnceCell<Bytes>>>>,
    /// Source modification time read before the load began
    pub source_modified: SystemTime,
}

impl std::fmt::Debug for LoadedLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedLayer")
            .field("layer", &self.metadata.layer_name)
            .field("features", &self.parsed.feature_count())
            .field("bytes", &self.geojson.len())
            .finish()
    }
}

impl LoadedLayer {
    fn new(
        parsed: Arc<ParsedLayer>,
        metadata: Arc<LayerMetadata>,
        geojson: Bytes,
        source_modified: SystemTime,
        max_variants: NonZeroUsize,
    ) -> Self {
        Self {
            parsed,
            metadata,
            geojson,
            variants: Mutex::new(LruCache::new(max_variants)),
            source_modified,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.parsed.feature_count()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.parsed.bounds
    }

    /// Number of simplified variants currently held.
    pub async fn variant_count(&self) -> usize {
        self.variants.lock().await.len()
    }

    /// Tier-2 bytes for a tolerance.
    ///
    /// Each variant is serialized at most once while it stays cached. Beyond
    /// the cap the least recently used variant is dropped; a later request
    /// for it serializes again from tier 1.
    pub async fn serialized(
        &self,
        tolerance: Option<f64>,
        stats: &CacheStats,
    ) -> VectorResult<Bytes> {
        let Some(tolerance) = geojson::effective_tolerance(tolerance) else {
            return Ok(self.geojson.clone());
        };

        let cell = {
            let key = tolerance.to_bits();
            let mut variants = self.variants.lock().await;
            if let Some(cell) = variants.get(&key).cloned() {
                cell
            } else {
                let cell = Arc::new(OnceCell::new());
                if let Some((evicted, _)) = variants.push(key, Arc::clone(&cell)) {
                    stats.variant_evictions.fetch_add(1, Ordering::Relaxed);
                    counter!("vector_variant_evictions_total").increment(1);
                    debug!(
                        layer = %self.metadata.layer_name,
                        tolerance = f64::from_bits(evicted),
                        "Evicted simplified variant"
                    );
                }
                cell
            }
        };

        let bytes = cell
            .get_or_try_init(|| async {
                let parsed = Arc::clone(&self.parsed);
                let metadata = Arc::clone(&self.metadata);
                tokio::task::spawn_blocking(move || {
                    geojson::serialize(&parsed, &metadata, Some(tolerance))
                })
                .await
                .map_err(|e| VectorError::Internal(format!("serialization task failed: {}", e)))
                .and_then(|result| result)
            })
            .await?;
        Ok(bytes.clone())
    }
}

enum SlotState {
    Discovered,
    Loading {
        sender: broadcast::Sender<LoadOutcome>,
        /// Payload being replaced after a staleness check
        previous: Option<Arc<LoadedLayer>>,
    },
    Loaded(Arc<LoadedLayer>),
    Unavailable(String),
}

/// Cache slot for one catalog entry.
pub struct LayerSlot {
    descriptor: LayerDescriptor,
    state: Mutex<SlotState>,
    source: Arc<dyn GeometrySource>,
    stats: Arc<CacheStats>,
    max_variants: NonZeroUsize,
}

impl LayerSlot {
    pub fn new(
        descriptor: LayerDescriptor,
        source: Arc<dyn GeometrySource>,
        stats: Arc<CacheStats>,
    ) -> Self {
        Self {
            descriptor,
            state: Mutex::new(SlotState::Discovered),
            source,
            stats,
            max_variants: NonZeroUsize::new(DEFAULT_MAX_VARIANTS).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// A slot that discovery already knows cannot load. It stays
    /// unavailable until a reload rebuilds it.
    pub fn unavailable(
        descriptor: LayerDescriptor,
        source: Arc<dyn GeometrySource>,
        stats: Arc<CacheStats>,
        reason: impl Into<String>,
    ) -> Self {
        let slot = Self::new(descriptor, source, stats);
        Self {
            state: Mutex::new(SlotState::Unavailable(reason.into())),
            ..slot
        }
    }

    /// Cap on simplified variants kept for this slot's payload. Zero is
    /// treated as one.
    pub fn with_max_variants(mut self, max: usize) -> Self {
        self.max_variants = NonZeroUsize::new(max).unwrap_or(NonZeroUsize::MIN);
        self
    }

    pub fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }

    pub async fn status(&self) -> LayerStatus {
        match &*self.state.lock().await {
            SlotState::Discovered => LayerStatus::Discovered,
            SlotState::Loading { previous: None, .. } => LayerStatus::Loading,
            SlotState::Loading {
                previous: Some(_), ..
            } => LayerStatus::Stale,
            SlotState::Loaded(_) => LayerStatus::Loaded,
            SlotState::Unavailable(_) => LayerStatus::Unavailable,
        }
    }

    /// Currently cached payload, without staleness checks or loading.
    pub async fn cached(&self) -> Option<Arc<LoadedLayer>> {
        match &*self.state.lock().await {
            SlotState::Loaded(layer) => Some(Arc::clone(layer)),
            _ => None,
        }
    }

    /// Serve the entry's GeoJSON, loading it first if needed.
    pub async fn serve(self: &Arc<Self>, tolerance: Option<f64>) -> VectorResult<Bytes> {
        let layer = self.get_loaded().await?;
        layer.serialized(tolerance, &self.stats).await
    }

    /// Return the loaded payload, running at most one load per slot at a time.
    pub async fn get_loaded(self: &Arc<Self>) -> VectorResult<Arc<LoadedLayer>> {
        let current = self.source.modified(&self.descriptor.path).await;

        let mut state = self.state.lock().await;
        let mut receiver = match &*state {
            SlotState::Loaded(layer) => match current {
                Ok(modified) if modified <= layer.source_modified => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    counter!("vector_tier2_hits_total").increment(1);
                    debug!(layer = %self.descriptor.key, "Serving cached layer");
                    return Ok(Arc::clone(layer));
                }
                Ok(_) => {
                    info!(
                        layer = %self.descriptor.key,
                        "Source file changed since last load; reloading"
                    );
                    let previous = Some(Arc::clone(layer));
                    self.start_load(&mut *state, previous)
                }
                Err(e) => {
                    warn!(
                        layer = %self.descriptor.key,
                        error = %e,
                        "Source file no longer readable; marking layer unavailable"
                    );
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    counter!("vector_load_failures_total").increment(1);
                    *state = SlotState::Unavailable(e.to_string());
                    return Err(VectorError::load(e));
                }
            },
            SlotState::Loading { sender, .. } => {
                self.stats.coalesced.fetch_add(1, Ordering::Relaxed);
                counter!("vector_coalesced_waiters_total").increment(1);
                debug!(
                    layer = %self.descriptor.key,
                    waiters = sender.receiver_count(),
                    "Waiting for in-flight load"
                );
                sender.subscribe()
            }
            SlotState::Discovered => self.start_load(&mut *state, None),
            SlotState::Unavailable(reason) => {
                return Err(VectorError::load(reason));
            }
        };
        drop(state);

        match receiver.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(VectorError::load("load finished without a result")),
        }
    }

    /// Install a `Loading` state and spawn the load. Must be called with the
    /// state lock held.
    fn start_load(
        self: &Arc<Self>,
        state: &mut SlotState,
        previous: Option<Arc<LoadedLayer>>,
    ) -> broadcast::Receiver<LoadOutcome> {
        let (sender, receiver) = broadcast::channel(1);
        *state = SlotState::Loading {
            sender: sender.clone(),
            previous,
        };
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let slot = Arc::clone(self);
        tokio::spawn(async move { slot.run_load(sender).await });
        receiver
    }

    async fn run_load(self: Arc<Self>, sender: broadcast::Sender<LoadOutcome>) {
        let start = Instant::now();

        // Inner task so a panic while loading still settles the slot.
        let slot = Arc::clone(&self);
        let result = match tokio::spawn(async move { slot.load_once().await }).await {
            Ok(result) => result,
            Err(e) => Err(VectorError::Internal(format!("load task failed: {}", e))),
        };

        let mut state = self.state.lock().await;
        let outcome = match result {
            Ok(layer) => {
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                self.stats.loads.fetch_add(1, Ordering::Relaxed);
                counter!("vector_loads_total").increment(1);
                histogram!("vector_load_duration_ms").record(elapsed_ms);
                info!(
                    layer = %self.descriptor.key,
                    features = layer.feature_count(),
                    bytes = layer.geojson.len(),
                    elapsed_ms = elapsed_ms as u64,
                    "Layer loaded"
                );
                *state = SlotState::Loaded(Arc::clone(&layer));
                Ok(layer)
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                counter!("vector_load_failures_total").increment(1);
                warn!(
                    layer = %self.descriptor.key,
                    error = %e,
                    "Layer load failed; marking unavailable until reload"
                );
                *state = SlotState::Unavailable(e.to_string());
                Err(VectorError::load(e))
            }
        };

        // Waiters subscribed under the lock, so all of them see this send.
        let _ = sender.send(outcome);
    }

    async fn load_once(&self) -> VectorResult<Arc<LoadedLayer>> {
        let modified = self.source.modified(&self.descriptor.path).await?;
        let parsed = Arc::new(loader::load_parsed(self.source.as_ref(), &self.descriptor).await?);
        let metadata = Arc::new(LayerMetadata::new(&self.descriptor, &parsed));

        let geojson = {
            let parsed = Arc::clone(&parsed);
            let metadata = Arc::clone(&metadata);
            tokio::task::spawn_blocking(move || geojson::serialize(&parsed, &metadata, None))
                .await
                .map_err(|e| VectorError::Internal(format!("serialization task failed: {}", e)))??
        };

        Ok(Arc::new(LoadedLayer::new(
            parsed,
            metadata,
            geojson,
            modified,
            self.max_variants,
        )))
    }

    /// True when a reload may keep this slot (and its cache) as is.
    pub async fn is_reusable(&self) -> bool {
        !matches!(&*self.state.lock().await, SlotState::Unavailable(_))
    }

    /// Listing record. Unavailable entries carry no feature-bearing fields.
    pub async fn summary(&self) -> LayerSummary {
        let descriptor = &self.descriptor;
        let state = self.state.lock().await;
        let (status, loaded) = match &*state {
            SlotState::Discovered => (LayerStatus::Discovered, None),
            SlotState::Loading { previous, .. } => match previous {
                Some(layer) => (LayerStatus::Stale, Some(Arc::clone(layer))),
                None => (LayerStatus::Loading, None),
            },
            SlotState::Loaded(layer) => (LayerStatus::Loaded, Some(Arc::clone(layer))),
            SlotState::Unavailable(_) => (LayerStatus::Unavailable, None),
        };
        drop(state);

        LayerSummary {
            id: descriptor.key.compound(),
            display_name: descriptor.display_name.clone(),
            source_file: descriptor.key.source_file.clone(),
            layer_name: descriptor.key.layer_name.clone(),
            geometry_type: descriptor.kind,
            feature_count: loaded.as_ref().map(|l| l.feature_count() as u64),
            bounds: loaded.as_ref().and_then(|l| l.bounds()),
            source_crs: descriptor.source_crs(),
            crs: CrsCode::CANONICAL,
            status,
            merged_from: descriptor.merged_from(),
            style: LayerStyle::default_for(descriptor.kind),
            last_modified: loaded
                .as_ref()
                .map(|l| DateTime::<Utc>::from(l.source_modified)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceFeature, SourceLayer};
    use async_trait::async_trait;
    use geo_types::point;
    use serde_json::Map;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use vector_common::{GeometryKind, LayerKey};

    /// In-memory source with a controllable mtime and read counter.
    struct FakeSource {
        reads: AtomicU64,
        features: AtomicU64,
        modified_secs: AtomicU64,
        fail: AtomicBool,
        delay: Duration,
    }

    impl FakeSource {
        fn new(features: u64) -> Self {
            Self {
                reads: AtomicU64::new(0),
                features: AtomicU64::new(features),
                modified_secs: AtomicU64::new(1_000),
                fail: AtomicBool::new(false),
                delay: Duration::from_millis(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl GeometrySource for FakeSource {
        async fn list_layers(&self, _path: &Path) -> VectorResult<Vec<SourceLayer>> {
            Ok(Vec::new())
        }

        async fn read_layer(&self, _path: &Path, _layer: &str) -> VectorResult<Vec<SourceFeature>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(VectorError::source_read("fake.gpkg", "disk I/O error"));
            }
            let count = self.features.load(Ordering::SeqCst);
            Ok((0..count)
                .map(|i| SourceFeature {
                    id: i as i64 + 1,
                    geometry: Some(point!(x: i as f64, y: 1.0).into()),
                    properties: Map::new(),
                })
                .collect())
        }

        async fn modified(&self, _path: &Path) -> VectorResult<SystemTime> {
            Ok(SystemTime::UNIX_EPOCH
                + Duration::from_secs(self.modified_secs.load(Ordering::SeqCst)))
        }
    }

    fn descriptor() -> LayerDescriptor {
        LayerDescriptor {
            key: LayerKey::new("fake.gpkg", "points"),
            display_name: "Fake - Points".to_string(),
            path: PathBuf::from("fake.gpkg"),
            kind: GeometryKind::Point,
            members: vec![SourceLayer {
                name: "points".to_string(),
                kind: GeometryKind::Point,
                crs: Some(CrsCode::CANONICAL),
            }],
            merged: false,
        }
    }

    fn slot(source: Arc<FakeSource>) -> Arc<LayerSlot> {
        Arc::new(LayerSlot::new(descriptor(), source, Arc::new(CacheStats::default())))
    }

    fn capped_slot(source: Arc<FakeSource>, max_variants: usize) -> Arc<LayerSlot> {
        Arc::new(
            LayerSlot::new(descriptor(), source, Arc::new(CacheStats::default()))
                .with_max_variants(max_variants),
        )
    }

    #[tokio::test]
    async fn test_second_request_is_a_hit() {
        let source = Arc::new(FakeSource::new(3));
        let slot = slot(Arc::clone(&source));

        let first = slot.serve(None).await.unwrap();
        let second = slot.serve(None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert_eq!(slot.status().await, LayerStatus::Loaded);

        let stats = slot.stats.snapshot();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.loads, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cold_requests_load_once() {
        let source = Arc::new(FakeSource::new(5).with_delay(Duration::from_millis(50)));
        let slot = slot(Arc::clone(&source));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let slot = Arc::clone(&slot);
                tokio::spawn(async move { slot.serve(None).await })
            })
            .collect();

        let results: Vec<Bytes> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_newer_mtime_triggers_reload() {
        let source = Arc::new(FakeSource::new(3));
        let slot = slot(Arc::clone(&source));
        assert_eq!(slot.get_loaded().await.unwrap().feature_count(), 3);

        source.features.store(4, Ordering::SeqCst);
        assert_eq!(slot.get_loaded().await.unwrap().feature_count(), 3);

        source.modified_secs.store(2_000, Ordering::SeqCst);
        assert_eq!(slot.get_loaded().await.unwrap().feature_count(), 4);
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_old_payload_survives_reload() {
        let source = Arc::new(FakeSource::new(2));
        let slot = slot(Arc::clone(&source));
        let old = slot.serve(None).await.unwrap();

        source.features.store(6, Ordering::SeqCst);
        source.modified_secs.store(5_000, Ordering::SeqCst);
        let new = slot.serve(None).await.unwrap();

        assert_ne!(old, new);
        let old_json: serde_json::Value = serde_json::from_slice(&old).unwrap();
        assert_eq!(old_json["features"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_sticky() {
        let source = Arc::new(FakeSource::new(3));
        source.fail.store(true, Ordering::SeqCst);
        let slot = slot(Arc::clone(&source));

        let err = slot.serve(None).await.unwrap_err();
        assert!(matches!(err, VectorError::Load { .. }));
        assert_eq!(slot.status().await, LayerStatus::Unavailable);

        source.fail.store(false, Ordering::SeqCst);
        assert!(slot.serve(None).await.is_err());
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert!(!slot.is_reusable().await);

        let summary = slot.summary().await;
        assert_eq!(summary.status, LayerStatus::Unavailable);
        assert_eq!(summary.feature_count, None);
        assert_eq!(summary.bounds, None);
    }

    #[tokio::test]
    async fn test_simplified_variants_are_cached() {
        let source = Arc::new(FakeSource::new(3));
        let slot = slot(Arc::clone(&source));

        let plain = slot.serve(None).await.unwrap();
        let zero = slot.serve(Some(0.0)).await.unwrap();
        assert_eq!(plain, zero);

        let a = slot.serve(Some(0.5)).await.unwrap();
        let b = slot.serve(Some(0.5)).await.unwrap();
        assert_eq!(a, b);

        let layer = slot.cached().await.unwrap();
        assert_eq!(layer.variants.lock().await.len(), 1);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_variant_count_is_bounded() {
        let source = Arc::new(FakeSource::new(50));
        let slot = capped_slot(Arc::clone(&source), 4);

        for i in 1..=200 {
            slot.serve(Some(1e-9 * i as f64)).await.unwrap();
        }

        let layer = slot.cached().await.unwrap();
        assert_eq!(layer.variant_count().await, 4);
        assert_eq!(slot.stats.snapshot().variant_evictions, 196);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_least_recently_used_variant_is_evicted() {
        let source = Arc::new(FakeSource::new(3));
        let slot = capped_slot(Arc::clone(&source), 2);

        let first = slot.serve(Some(0.1)).await.unwrap();
        slot.serve(Some(0.2)).await.unwrap();
        slot.serve(Some(0.1)).await.unwrap();
        slot.serve(Some(0.3)).await.unwrap();

        let layer = slot.cached().await.unwrap();
        {
            let variants = layer.variants.lock().await;
            assert!(variants.contains(&0.1f64.to_bits()));
            assert!(!variants.contains(&0.2f64.to_bits()));
            assert!(variants.contains(&0.3f64.to_bits()));
        }

        // Evicted variants are rebuilt from tier 1 with identical bytes.
        slot.serve(Some(0.2)).await.unwrap();
        assert_eq!(slot.serve(Some(0.1)).await.unwrap(), first);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slot_created_unavailable_never_reads() {
        let source = Arc::new(FakeSource::new(3));
        let slot = Arc::new(LayerSlot::unavailable(
            descriptor(),
            source.clone(),
            Arc::new(CacheStats::default()),
            "Unsupported CRS: EPSG:27700",
        ));

        assert_eq!(slot.status().await, LayerStatus::Unavailable);
        match slot.serve(None).await {
            Err(VectorError::Load { reason }) => assert!(reason.contains("27700")),
            other => panic!("expected load error, got {:?}", other),
        }
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
        assert!(!slot.is_reusable().await);
    }

    #[tokio::test]
    async fn test_summary_after_load() {
        let source = Arc::new(FakeSource::new(3));
        let slot = slot(Arc::clone(&source));

        let before = slot.summary().await;
        assert_eq!(before.status, LayerStatus::Discovered);
        assert_eq!(before.feature_count, None);

        slot.serve(None).await.unwrap();
        let after = slot.summary().await;
        assert_eq!(after.id, "fake.gpkg/points");
        assert_eq!(after.status, LayerStatus::Loaded);
        assert_eq!(after.feature_count, Some(3));
        assert_eq!(after.bounds, Some(BoundingBox::new(0.0, 1.0, 2.0, 1.0)));
        assert!(after.last_modified.is_some());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        stats.hits.store(3, Ordering::Relaxed);
        stats.misses.store(1, Ordering::Relaxed);
        assert_eq!(stats.hit_rate(), 75.0);
    }
}
