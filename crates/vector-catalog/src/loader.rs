//! Tier-1 loading: read member layers, normalize CRS, concatenate.

use std::time::Instant;

use projection::CrsTransform;
use tracing::debug;
use vector_common::{VectorError, VectorResult};

use crate::layer::{FeatureId, LayerDescriptor, LayerFeature, ParsedLayer};
use crate::source::{GeometrySource, SourceFeature, SourceLayer};

/// Read and normalize every member of `descriptor` into one parsed layer.
///
/// Members are read in descriptor order, so merged feature order is stable
/// across loads. Any member failure fails the whole entry.
pub async fn load_parsed(
    source: &dyn GeometrySource,
    descriptor: &LayerDescriptor,
) -> VectorResult<ParsedLayer> {
    let start = Instant::now();
    let mut features = Vec::new();

    for member in &descriptor.members {
        let transform = member_transform(member)?;
        let raw = source.read_layer(&descriptor.path, &member.name).await?;
        let merged = descriptor.merged;
        let name = member.name.clone();

        let normalized = tokio::task::spawn_blocking(move || {
            normalize_features(&transform, raw, merged.then_some(name.as_str()))
        })
        .await
        .map_err(|e| VectorError::Internal(format!("normalization task failed: {}", e)))??;

        features.extend(normalized);
    }

    let parsed = ParsedLayer::new(features);
    debug!(
        layer = %descriptor.key,
        features = parsed.feature_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Parsed layer"
    );
    Ok(parsed)
}

/// Check that every member's CRS can be normalized, without reading features.
pub fn check_members(descriptor: &LayerDescriptor) -> VectorResult<()> {
    for member in &descriptor.members {
        member_transform(member)?;
    }
    Ok(())
}

fn member_transform(member: &SourceLayer) -> VectorResult<CrsTransform> {
    let crs = member
        .crs
        .ok_or_else(|| VectorError::reprojection("unknown", "CRS has no EPSG definition"))?;
    Ok(CrsTransform::new(crs)?)
}

/// Reproject raw features and assign entry-level ids.
///
/// With a `prefix` (merged entries) ids become `"<sublayer>:<fid>"` so they
/// stay unique across members.
fn normalize_features(
    transform: &CrsTransform,
    raw: Vec<SourceFeature>,
    prefix: Option<&str>,
) -> VectorResult<Vec<LayerFeature>> {
    raw.into_iter()
        .map(|f| {
            let geometry = match f.geometry {
                Some(g) if transform.is_identity() => Some(g),
                Some(g) => Some(transform.to_canonical(&g)?),
                None => None,
            };
            let id = match prefix {
                Some(p) => FeatureId::Text(format!("{}:{}", p, f.id)),
                None => FeatureId::Number(f.id),
            };
            Ok(LayerFeature {
                id,
                geometry,
                properties: f.properties,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Geometry};
    use serde_json::Map;
    use vector_common::{CrsCode, GeometryKind};

    fn raw(id: i64, geometry: Option<Geometry<f64>>) -> SourceFeature {
        SourceFeature {
            id,
            geometry,
            properties: Map::new(),
        }
    }

    #[test]
    fn test_member_without_epsg_fails() {
        let member = SourceLayer {
            name: "custom".to_string(),
            kind: GeometryKind::Point,
            crs: None,
        };
        assert!(matches!(
            member_transform(&member),
            Err(VectorError::Reprojection { .. })
        ));
    }

    #[test]
    fn test_unsupported_crs_fails() {
        let member = SourceLayer {
            name: "osgb".to_string(),
            kind: GeometryKind::Point,
            crs: Some(CrsCode::epsg(27700)),
        };
        assert!(matches!(
            member_transform(&member),
            Err(VectorError::Reprojection { .. })
        ));
    }

    #[test]
    fn test_merged_ids_are_prefixed() {
        let transform = CrsTransform::new(CrsCode::CANONICAL).unwrap();
        let features = normalize_features(
            &transform,
            vec![raw(1, Some(point!(x: 1.0, y: 2.0).into())), raw(2, None)],
            Some("areas_2"),
        )
        .unwrap();
        assert_eq!(features[0].id, FeatureId::Text("areas_2:1".into()));
        assert_eq!(features[1].id, FeatureId::Text("areas_2:2".into()));
        assert!(features[1].geometry.is_none());
    }

    #[test]
    fn test_projected_features_are_normalized() {
        let transform = CrsTransform::new(CrsCode::WEB_MERCATOR).unwrap();
        let features = normalize_features(
            &transform,
            vec![raw(7, Some(point!(x: 0.0, y: 0.0).into()))],
            None,
        )
        .unwrap();
        assert_eq!(features[0].id, FeatureId::Number(7));
        match &features[0].geometry {
            Some(Geometry::Point(p)) => {
                assert!(p.x().abs() < 1e-9);
                assert!(p.y().abs() < 1e-9);
            }
            other => panic!("expected point, got {:?}", other),
        }
    }
}
