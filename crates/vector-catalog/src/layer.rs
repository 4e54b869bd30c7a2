//! Catalog entry descriptors and loaded layer data.

use std::path::PathBuf;

use geo::BoundingRect;
use geo_types::Geometry;
use serde::Serialize;
use serde_json::{Map, Value};

use vector_common::{BoundingBox, CrsCode, GeometryKind, LayerKey, LayerStyle};

use crate::source::SourceLayer;

/// Immutable discovery-time description of a catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub key: LayerKey,
    /// Unique display name (disambiguated at discovery when needed)
    pub display_name: String,
    /// Container path; never exposed through listings
    pub path: PathBuf,
    pub kind: GeometryKind,
    /// Source layers read for this entry; more than one for merged entries
    pub members: Vec<SourceLayer>,
    pub merged: bool,
}

impl LayerDescriptor {
    /// CRS shared by every member, if they agree.
    pub fn source_crs(&self) -> Option<CrsCode> {
        let first = self.members.first()?.crs?;
        self.members
            .iter()
            .all(|m| m.crs == Some(first))
            .then_some(first)
    }

    pub fn merged_from(&self) -> Vec<String> {
        if self.merged {
            self.members.iter().map(|m| m.name.clone()).collect()
        } else {
            Vec::new()
        }
    }
}

/// Feature identifier: the source primary key, or `sublayer:fid` in merged layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

/// A feature in the canonical CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFeature {
    pub id: FeatureId,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

/// Tier 1: parsed, normalized geometry and attributes.
#[derive(Debug, Clone)]
pub struct ParsedLayer {
    pub features: Vec<LayerFeature>,
    /// Union extent of all feature geometries; `None` when none have geometry
    pub bounds: Option<BoundingBox>,
}

impl ParsedLayer {
    pub fn new(features: Vec<LayerFeature>) -> Self {
        let extents: Vec<BoundingBox> = features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .filter_map(|g| g.bounding_rect())
            .map(|r| BoundingBox::new(r.min().x, r.min().y, r.max().x, r.max().y))
            .collect();
        let bounds = BoundingBox::union_all(&extents);
        Self { features, bounds }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

/// The `metadata` foreign member attached to served FeatureCollections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerMetadata {
    pub layer_name: String,
    pub display_name: String,
    pub source_file: String,
    pub geometry_type: GeometryKind,
    pub feature_count: usize,
    pub bounds: Option<[f64; 4]>,
    pub crs: CrsCode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged_from: Vec<String>,
    pub style: LayerStyle,
}

impl LayerMetadata {
    pub fn new(descriptor: &LayerDescriptor, parsed: &ParsedLayer) -> Self {
        Self {
            layer_name: descriptor.key.layer_name.clone(),
            display_name: descriptor.display_name.clone(),
            source_file: descriptor.key.source_file.clone(),
            geometry_type: descriptor.kind,
            feature_count: parsed.feature_count(),
            bounds: parsed.bounds.map(|b| b.to_array()),
            crs: CrsCode::CANONICAL,
            merged_from: descriptor.merged_from(),
            style: LayerStyle::default_for(descriptor.kind),
        }
    }
}
