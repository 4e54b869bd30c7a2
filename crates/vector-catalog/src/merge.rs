//! Layer merge policy.
//!
//! Decides, per container file, whether its sub-layers become one logical
//! layer named [`MERGED_LAYER_NAME`](vector_common::MERGED_LAYER_NAME) or stay
//! independent entries.

use std::collections::HashSet;

use tracing::warn;
use vector_common::GeometryKind;

use crate::config::EngineConfig;
use crate::source::SourceLayer;

/// How one file's layers map onto catalog entries.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPlan {
    /// One source layer, one entry.
    Single(SourceLayer),
    /// Several source layers concatenated into one entry.
    Merged {
        kind: GeometryKind,
        members: Vec<SourceLayer>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MergePolicy {
    files: HashSet<String>,
    by_convention: bool,
}

impl MergePolicy {
    pub fn new(files: HashSet<String>, by_convention: bool) -> Self {
        Self {
            files,
            by_convention,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.merge_files(), config.merge.by_convention)
    }

    fn applies_to(&self, source_file: &str, layers: &[SourceLayer]) -> bool {
        if layers.len() < 2 {
            return false;
        }
        if self.files.contains(source_file) {
            return true;
        }
        if !self.by_convention {
            return false;
        }
        let base = convention_base(&layers[0].name);
        layers.iter().all(|l| convention_base(&l.name) == base)
    }

    /// Plan the entries for one file's layers.
    pub fn plan(&self, source_file: &str, layers: Vec<SourceLayer>) -> Vec<EntryPlan> {
        if !self.applies_to(source_file, &layers) {
            return layers.into_iter().map(EntryPlan::Single).collect();
        }

        match GeometryKind::common(layers.iter().map(|l| l.kind)) {
            Some(kind) => vec![EntryPlan::Merged {
                kind,
                members: layers,
            }],
            None => {
                warn!(
                    file = %source_file,
                    layers = layers.len(),
                    "Sub-layers mix geometry families; keeping them as separate layers"
                );
                layers.into_iter().map(EntryPlan::Single).collect()
            }
        }
    }
}

/// Strip a trailing `_<digits>` or `_part<digits>` from a layer name.
pub fn convention_base(name: &str) -> &str {
    let Some((base, suffix)) = name.rsplit_once('_') else {
        return name;
    };
    let digits = match suffix.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("part") => &suffix[4..],
        _ => suffix,
    };
    if !base.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        base
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_common::CrsCode;

    fn layer(name: &str, kind: GeometryKind) -> SourceLayer {
        SourceLayer {
            name: name.to_string(),
            kind,
            crs: Some(CrsCode::CANONICAL),
        }
    }

    #[test]
    fn test_convention_base() {
        assert_eq!(convention_base("areas_1"), "areas");
        assert_eq!(convention_base("areas_part2"), "areas");
        assert_eq!(convention_base("areas_Part12"), "areas");
        assert_eq!(convention_base("areas_partx"), "areas_partx");
        assert_eq!(convention_base("areas_part"), "areas_part");
        assert_eq!(convention_base("marine_areas"), "marine_areas");
        assert_eq!(convention_base("_1"), "_1");
        assert_eq!(convention_base("zones"), "zones");
    }

    #[test]
    fn test_convention_merges_numbered_parts() {
        let policy = MergePolicy::new(HashSet::new(), true);
        let plan = policy.plan(
            "cables.gpkg",
            vec![
                layer("cables_1", GeometryKind::LineString),
                layer("cables_2", GeometryKind::MultiLineString),
            ],
        );
        assert_eq!(plan.len(), 1);
        match &plan[0] {
            EntryPlan::Merged { kind, members } => {
                assert_eq!(*kind, GeometryKind::MultiLineString);
                assert_eq!(members.len(), 2);
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_layers_stay_separate() {
        let policy = MergePolicy::new(HashSet::new(), true);
        let plan = policy.plan(
            "habitats.gpkg",
            vec![
                layer("zones", GeometryKind::Polygon),
                layer("stations", GeometryKind::Point),
            ],
        );
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|p| matches!(p, EntryPlan::Single(_))));
    }

    #[test]
    fn test_explicit_file_list() {
        let files: HashSet<String> = ["habitats.gpkg".to_string()].into_iter().collect();
        let policy = MergePolicy::new(files, false);
        let plan = policy.plan(
            "habitats.gpkg",
            vec![
                layer("north", GeometryKind::Polygon),
                layer("south", GeometryKind::Polygon),
            ],
        );
        assert!(matches!(
            &plan[..],
            [EntryPlan::Merged { kind: GeometryKind::Polygon, .. }]
        ));

        let other = policy.plan(
            "other.gpkg",
            vec![
                layer("part_1", GeometryKind::Polygon),
                layer("part_2", GeometryKind::Polygon),
            ],
        );
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn test_mixed_families_fall_back() {
        let files: HashSet<String> = ["mixed.gpkg".to_string()].into_iter().collect();
        let policy = MergePolicy::new(files, true);
        let plan = policy.plan(
            "mixed.gpkg",
            vec![
                layer("a", GeometryKind::Point),
                layer("b", GeometryKind::Polygon),
            ],
        );
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_single_layer_never_merges() {
        let files: HashSet<String> = ["one.gpkg".to_string()].into_iter().collect();
        let policy = MergePolicy::new(files, true);
        let plan = policy.plan("one.gpkg", vec![layer("only_1", GeometryKind::Point)]);
        assert!(matches!(&plan[..], [EntryPlan::Single(_)]));
    }
}
