//! Vector layer catalog.
//!
//! Discovers GeoPackage containers in a data directory, merges sub-layers
//! where configured, resolves client identifiers against the discovered set
//! and serves each layer as GeoJSON through a two-tier, single-flight cache.
//!
//! ```text
//! data_dir ──► GeometrySource ──► MergePolicy ──► CatalogIndex
//!                                                    │
//!   identifier ──► resolve ──► LayerSlot ──► tier 1 (parsed, EPSG:4326)
//!                                                └──► tier 2 (GeoJSON bytes)
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod geojson;
pub mod layer;
pub mod loader;
pub mod merge;
pub mod resolver;
pub mod source;

pub use cache::{CacheStats, CacheStatsSnapshot, LayerSlot, LoadedLayer};
pub use catalog::{Catalog, DiscoveryReport};
pub use config::{EngineConfig, MergeConfig};
pub use layer::{FeatureId, LayerDescriptor, LayerFeature, LayerMetadata, ParsedLayer};
pub use merge::{EntryPlan, MergePolicy};
pub use resolver::CatalogIndex;
pub use source::{GeometrySource, GpkgSource, SourceFeature, SourceLayer};
