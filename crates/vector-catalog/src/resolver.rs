//! Identifier index over discovered entries.
//!
//! Two lookup keys point into one list of slots: the legacy display name and
//! the compound `source_file/layer_name` id. Nothing outside these two maps is
//! ever resolved, so identifiers never reach the filesystem.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use vector_common::{VectorError, VectorResult};

use crate::cache::LayerSlot;
use crate::layer::LayerDescriptor;

/// Immutable snapshot of the catalog after one discovery run.
#[derive(Default)]
pub struct CatalogIndex {
    entries: Vec<Arc<LayerSlot>>,
    by_display: HashMap<String, usize>,
    by_compound: HashMap<String, usize>,
}

impl CatalogIndex {
    /// Build an index from descriptors in discovery order.
    ///
    /// `make_slot` supplies the slot for each descriptor, which lets a reload
    /// hand back slots from the previous index. Display names are made unique
    /// here: a colliding name gets the source file appended, and if that is
    /// still taken the entry is reachable by compound id only.
    pub fn build<F>(descriptors: Vec<LayerDescriptor>, mut make_slot: F) -> Self
    where
        F: FnMut(LayerDescriptor) -> Arc<LayerSlot>,
    {
        let mut index = CatalogIndex::default();

        for mut descriptor in descriptors {
            let compound = descriptor.key.compound();
            if index.by_compound.contains_key(&compound) {
                warn!(layer = %compound, "Duplicate layer id; keeping the first entry");
                continue;
            }

            let display = index.unique_display_name(&descriptor);
            // Unindexed entries list their compound id as display name.
            descriptor.display_name = display.clone().unwrap_or_else(|| compound.clone());

            let position = index.entries.len();
            index.by_compound.insert(compound, position);
            if let Some(name) = display {
                index.by_display.insert(name, position);
            }
            index.entries.push(make_slot(descriptor));
        }

        index.warn_cross_collisions();
        index
    }

    fn unique_display_name(&self, descriptor: &LayerDescriptor) -> Option<String> {
        let base = &descriptor.display_name;
        if !self.by_display.contains_key(base) {
            return Some(base.clone());
        }

        let qualified = format!("{} ({})", base, descriptor.key.source_file);
        if !self.by_display.contains_key(&qualified) {
            warn!(
                display_name = %base,
                renamed = %qualified,
                "Display name collision; disambiguating with source file"
            );
            return Some(qualified);
        }

        warn!(
            display_name = %base,
            layer = %descriptor.key,
            "Display name collision could not be resolved; layer is addressable by id only"
        );
        None
    }

    /// Warn where a display name equals a different entry's compound id.
    fn warn_cross_collisions(&self) {
        for (name, &position) in &self.by_display {
            if let Some(&other) = self.by_compound.get(name) {
                if other != position {
                    warn!(
                        identifier = %name,
                        "Display name shadows another layer's id; the display name wins"
                    );
                }
            }
        }
    }

    /// Map a client identifier to exactly one entry.
    ///
    /// Display names are tried first, then compound ids. Anything else is
    /// `NotFound`, whatever it looks like.
    pub fn resolve(&self, identifier: &str) -> VectorResult<&Arc<LayerSlot>> {
        self.by_display
            .get(identifier)
            .or_else(|| self.by_compound.get(identifier))
            .and_then(|&position| self.entries.get(position))
            .ok_or_else(|| {
                debug!(identifier = %identifier.escape_debug(), "Unknown layer identifier");
                VectorError::NotFound
            })
    }

    pub fn entries(&self) -> &[Arc<LayerSlot>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::source::{GeometrySource, SourceFeature, SourceLayer};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use vector_common::{GeometryKind, LayerKey};

    struct NoSource;

    #[async_trait]
    impl GeometrySource for NoSource {
        async fn list_layers(&self, _path: &Path) -> VectorResult<Vec<SourceLayer>> {
            Ok(Vec::new())
        }

        async fn read_layer(&self, _path: &Path, _layer: &str) -> VectorResult<Vec<SourceFeature>> {
            Ok(Vec::new())
        }
    }

    fn descriptor(file: &str, layer: &str) -> LayerDescriptor {
        let key = LayerKey::new(file, layer);
        LayerDescriptor {
            display_name: key.display_name(),
            path: PathBuf::from("/data").join(file),
            kind: GeometryKind::Polygon,
            members: Vec::new(),
            merged: false,
            key,
        }
    }

    fn build(descriptors: Vec<LayerDescriptor>) -> CatalogIndex {
        let source: Arc<dyn GeometrySource> = Arc::new(NoSource);
        let stats = Arc::new(CacheStats::default());
        CatalogIndex::build(descriptors, |d| {
            Arc::new(LayerSlot::new(d, Arc::clone(&source), Arc::clone(&stats)))
        })
    }

    fn compound_of(slot: &Arc<LayerSlot>) -> String {
        slot.descriptor().key.compound()
    }

    #[test]
    fn test_both_forms_resolve_to_same_entry() {
        let index = build(vec![
            descriptor("habitats.gpkg", "zones"),
            descriptor("cables.gpkg", "merged"),
        ]);

        let by_display = index.resolve("Cables - Merged").unwrap();
        let by_compound = index.resolve("cables.gpkg/merged").unwrap();
        assert!(Arc::ptr_eq(by_display, by_compound));
    }

    #[test]
    fn test_near_misses_are_not_found() {
        let index = build(vec![descriptor("habitats.gpkg", "zones")]);
        for id in [
            "habitats.gpkg / zones",
            "habitats.gpkg/zones/",
            "HABITATS.GPKG/zones",
            "habitats - zones",
            "habitats.gpkg",
            "/data/habitats.gpkg",
            "",
        ] {
            assert!(
                matches!(index.resolve(id), Err(VectorError::NotFound)),
                "{:?} should not resolve",
                id
            );
        }
    }

    #[test]
    fn test_display_collision_is_disambiguated() {
        // Both derive "Areas - Zones".
        let index = build(vec![
            descriptor("areas.gpkg", "zones"),
            descriptor("Areas.GPKG", "zones"),
        ]);

        assert_eq!(compound_of(index.resolve("Areas - Zones").unwrap()), "areas.gpkg/zones");
        let second = index.resolve("Areas - Zones (Areas.GPKG)").unwrap();
        assert_eq!(compound_of(second), "Areas.GPKG/zones");
        assert_eq!(second.descriptor().display_name, "Areas - Zones (Areas.GPKG)");
    }

    #[test]
    fn test_unresolvable_collision_keeps_compound_only() {
        let mut first = descriptor("a.gpkg", "x");
        first.display_name = "Shared".to_string();
        let mut second = descriptor("b.gpkg", "x");
        second.display_name = "Shared (b.gpkg)".to_string();
        let mut third = descriptor("b.gpkg", "y");
        third.display_name = "Shared".to_string();
        // third would become "Shared (b.gpkg)", which second already holds.

        let index = build(vec![first, second, third]);
        assert_eq!(index.len(), 3);
        assert_eq!(compound_of(index.resolve("Shared").unwrap()), "a.gpkg/x");
        assert_eq!(compound_of(index.resolve("Shared (b.gpkg)").unwrap()), "b.gpkg/x");
        let third = index.resolve("b.gpkg/y").unwrap();
        assert_eq!(compound_of(third), "b.gpkg/y");
        assert_eq!(third.descriptor().display_name, "b.gpkg/y");
    }

    #[test]
    fn test_display_name_wins_over_compound() {
        let mut shadowing = descriptor("a.gpkg", "x");
        shadowing.display_name = "b.gpkg/y".to_string();
        let index = build(vec![shadowing, descriptor("b.gpkg", "y")]);

        assert_eq!(compound_of(index.resolve("b.gpkg/y").unwrap()), "a.gpkg/x");
    }

    #[test]
    fn test_duplicate_compound_keeps_first() {
        let mut dup = descriptor("a.gpkg", "x");
        dup.display_name = "Other".to_string();
        let index = build(vec![descriptor("a.gpkg", "x"), dup]);
        assert_eq!(index.len(), 1);
        assert!(index.resolve("Other").is_err());
    }
}
