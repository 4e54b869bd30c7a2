//! Layer identity, geometry classification and listing records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BoundingBox, CrsCode, LayerStyle};

/// Synthetic layer name given to entries produced by merging sub-layers.
pub const MERGED_LAYER_NAME: &str = "merged";

/// Unique identity of a logical layer: container file plus layer name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerKey {
    /// Container file name, including extension (e.g. "habitats.gpkg").
    pub source_file: String,
    /// Layer inside the container, or [`MERGED_LAYER_NAME`].
    pub layer_name: String,
}

impl LayerKey {
    pub fn new(source_file: impl Into<String>, layer_name: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            layer_name: layer_name.into(),
        }
    }

    /// Canonical compound identifier: `source_file + "/" + layer_name`, verbatim.
    pub fn compound(&self) -> String {
        format!("{}/{}", self.source_file, self.layer_name)
    }

    /// Container file name without its extension.
    pub fn file_stem(&self) -> &str {
        match self.source_file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.source_file,
        }
    }

    /// Legacy human-facing label for this layer.
    pub fn display_name(&self) -> String {
        display_name(self.file_stem(), &self.layer_name)
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_file, self.layer_name)
    }
}

/// Derive the legacy display name from a file stem and layer name.
///
/// Underscores become spaces and words are title-cased. When the layer is
/// named after its file only the file part is used.
pub fn display_name(file_stem: &str, layer_name: &str) -> String {
    let file_display = title_case(&file_stem.replace('_', " "));
    if layer_name.to_lowercase() == file_stem.to_lowercase() {
        file_display
    } else {
        let layer_display = title_case(&layer_name.replace('_', " "));
        format!("{} - {}", file_display, layer_display)
    }
}

/// Uppercase letters that follow a non-letter, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// The six geometry kinds a logical layer can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

/// Dimensional family of a geometry kind; merging requires a shared family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryFamily {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Parse a geometry type name (GeoPackage, WKT or GeoJSON spelling).
    ///
    /// Returns `None` for generic or collection types, which have no fixed kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "POINT" => Some(GeometryKind::Point),
            "MULTIPOINT" => Some(GeometryKind::MultiPoint),
            "LINESTRING" => Some(GeometryKind::LineString),
            "MULTILINESTRING" => Some(GeometryKind::MultiLineString),
            "POLYGON" => Some(GeometryKind::Polygon),
            "MULTIPOLYGON" => Some(GeometryKind::MultiPolygon),
            _ => None,
        }
    }

    pub fn family(&self) -> GeometryFamily {
        match self {
            GeometryKind::Point | GeometryKind::MultiPoint => GeometryFamily::Point,
            GeometryKind::LineString | GeometryKind::MultiLineString => GeometryFamily::Line,
            GeometryKind::Polygon | GeometryKind::MultiPolygon => GeometryFamily::Polygon,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            GeometryKind::MultiPoint | GeometryKind::MultiLineString | GeometryKind::MultiPolygon
        )
    }

    /// The multi-part kind of the same family.
    pub fn to_multi(&self) -> Self {
        match self.family() {
            GeometryFamily::Point => GeometryKind::MultiPoint,
            GeometryFamily::Line => GeometryKind::MultiLineString,
            GeometryFamily::Polygon => GeometryKind::MultiPolygon,
        }
    }

    /// Combined kind of several layers, or `None` when families differ.
    ///
    /// Identical kinds are kept; a mix of single and multi variants widens to multi.
    pub fn common<I>(kinds: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeometryKind>,
    {
        let mut iter = kinds.into_iter();
        let first = iter.next()?;
        iter.try_fold(first, |acc, kind| {
            if kind == acc {
                Some(acc)
            } else if kind.family() == acc.family() {
                Some(acc.to_multi())
            } else {
                None
            }
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a layer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerStatus {
    /// Metadata known, geometry not loaded.
    Discovered,
    /// A load is in flight.
    Loading,
    /// Tier 1 and tier 2 populated.
    Loaded,
    /// Source changed since the last load; a reload is pending.
    Stale,
    /// Load or reprojection failed; retried only after a reload.
    Unavailable,
}

impl LayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerStatus::Discovered => "discovered",
            LayerStatus::Loading => "loading",
            LayerStatus::Loaded => "loaded",
            LayerStatus::Stale => "stale",
            LayerStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata-only listing record for layer pickers.
///
/// Never carries filesystem paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Compound identifier (`source_file/layer_name`)
    pub id: String,
    pub display_name: String,
    pub source_file: String,
    pub layer_name: String,
    pub geometry_type: GeometryKind,
    /// Known once loaded; absent for unavailable layers
    pub feature_count: Option<u64>,
    /// Canonical-CRS extent; absent until loaded
    pub bounds: Option<BoundingBox>,
    pub source_crs: Option<CrsCode>,
    pub crs: CrsCode,
    pub status: LayerStatus,
    /// Sub-layers combined into a merged entry (empty otherwise)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_from: Vec<String>,
    pub style: LayerStyle,
    /// Source modification time captured at the last successful load
    pub last_modified: Option<DateTime<Utc>>,
}

/// Aggregate extent over every loaded layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsSummary {
    pub overall_bounds: [f64; 4],
    pub center: [f64; 2],
    pub layer_count: usize,
}

impl BoundsSummary {
    /// Summarize a set of layer extents; `None` when there are none.
    pub fn from_bounds<'a, I>(bounds: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        let all: Vec<&BoundingBox> = bounds.into_iter().collect();
        let overall = BoundingBox::union_all(all.iter().copied())?;
        let (cx, cy) = overall.center();
        Some(Self {
            overall_bounds: overall.to_array(),
            center: [cx, cy],
            layer_count: all.len(),
        })
    }
}
