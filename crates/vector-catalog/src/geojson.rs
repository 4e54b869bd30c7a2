//! GeoJSON serialization of parsed layers (tier 2).
//!
//! Output is an RFC 7946 FeatureCollection with a `metadata` foreign member
//! describing the layer. Feature order follows tier 1, so serializing the
//! same parsed layer twice yields identical bytes.

use bytes::Bytes;
use geo::Simplify;
use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Polygon};
use serde::Serialize;
use serde_json::{Map, Value};

use vector_common::VectorResult;

use crate::layer::{FeatureId, LayerMetadata, ParsedLayer};

#[derive(Debug, Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    type_: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<[f64; 4]>,

    features: Vec<Feature<'a>>,

    metadata: &'a LayerMetadata,
}

#[derive(Debug, Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    type_: &'static str,

    id: &'a FeatureId,

    /// Serialized as `null` for features without geometry
    geometry: Option<GeoJsonGeometry>,

    properties: &'a Map<String, Value>,
}

/// GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

fn position(c: Coord<f64>) -> [f64; 2] {
    [c.x, c.y]
}

fn positions(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.0.iter().copied().map(position).collect()
}

fn rings(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(positions)
        .collect()
}

impl From<&Geometry<f64>> for GeoJsonGeometry {
    fn from(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(p) => GeoJsonGeometry::Point {
                coordinates: position(p.0),
            },
            Geometry::MultiPoint(mp) => GeoJsonGeometry::MultiPoint {
                coordinates: mp.0.iter().map(|p| position(p.0)).collect(),
            },
            Geometry::Line(l) => GeoJsonGeometry::LineString {
                coordinates: vec![position(l.start), position(l.end)],
            },
            Geometry::LineString(ls) => GeoJsonGeometry::LineString {
                coordinates: positions(ls),
            },
            Geometry::MultiLineString(mls) => GeoJsonGeometry::MultiLineString {
                coordinates: mls.0.iter().map(positions).collect(),
            },
            Geometry::Polygon(p) => GeoJsonGeometry::Polygon {
                coordinates: rings(p),
            },
            Geometry::MultiPolygon(mp) => GeoJsonGeometry::MultiPolygon {
                coordinates: mp.0.iter().map(rings).collect(),
            },
            Geometry::Rect(r) => GeoJsonGeometry::Polygon {
                coordinates: rings(&r.to_polygon()),
            },
            Geometry::Triangle(t) => GeoJsonGeometry::Polygon {
                coordinates: rings(&t.to_polygon()),
            },
            Geometry::GeometryCollection(gc) => GeoJsonGeometry::GeometryCollection {
                geometries: gc.0.iter().map(GeoJsonGeometry::from).collect(),
            },
        }
    }
}

/// Normalize a requested tolerance: anything not strictly positive and finite
/// means "no simplification".
pub fn effective_tolerance(tolerance: Option<f64>) -> Option<f64> {
    tolerance.filter(|t| t.is_finite() && *t > 0.0)
}

fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let exterior = polygon.exterior().simplify(&tolerance);
    if exterior.0.len() < 4 {
        return polygon.clone();
    }
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| ring.simplify(&tolerance))
        .filter(|ring| ring.0.len() >= 4)
        .collect();
    Polygon::new(exterior, interiors)
}

/// Douglas-Peucker simplification, ring by ring.
///
/// Points are returned unchanged. Holes that would collapse are dropped; a
/// polygon whose shell would collapse is kept as is.
pub fn simplify_geometry(geometry: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify(&tolerance)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString::new(
            mls.0.iter().map(|ls| ls.simplify(&tolerance)).collect(),
        )),
        Geometry::Polygon(p) => Geometry::Polygon(simplify_polygon(p, tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
            mp.0.iter().map(|p| simplify_polygon(p, tolerance)).collect(),
        )),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(
            gc.0.iter()
                .map(|g| simplify_geometry(g, tolerance))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Serialize a parsed layer to GeoJSON bytes, optionally simplified.
pub fn serialize(
    parsed: &ParsedLayer,
    metadata: &LayerMetadata,
    tolerance: Option<f64>,
) -> VectorResult<Bytes> {
    let tolerance = effective_tolerance(tolerance);

    let features = parsed
        .features
        .iter()
        .map(|f| {
            let geometry = f.geometry.as_ref().map(|g| match tolerance {
                Some(t) => GeoJsonGeometry::from(&simplify_geometry(g, t)),
                None => GeoJsonGeometry::from(g),
            });
            Feature {
                type_: "Feature",
                id: &f.id,
                geometry,
                properties: &f.properties,
            }
        })
        .collect();

    let collection = FeatureCollection {
        type_: "FeatureCollection",
        bbox: parsed.bounds.map(|b| b.to_array()),
        features,
        metadata,
    };

    Ok(Bytes::from(serde_json::to_vec(&collection)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerDescriptor, LayerFeature};
    use geo_types::{line_string, point, polygon, GeometryCollection};
    use serde_json::json;
    use std::path::PathBuf;
    use vector_common::{GeometryKind, LayerKey};

    fn descriptor(kind: GeometryKind) -> LayerDescriptor {
        LayerDescriptor {
            key: LayerKey::new("habitats.gpkg", "zones"),
            display_name: "Habitats - Zones".to_string(),
            path: PathBuf::from("/srv/data/habitats.gpkg"),
            kind,
            members: Vec::new(),
            merged: false,
        }
    }

    fn parsed(features: Vec<(Option<Geometry<f64>>, Value)>) -> ParsedLayer {
        ParsedLayer::new(
            features
                .into_iter()
                .enumerate()
                .map(|(i, (geometry, props))| LayerFeature {
                    id: FeatureId::Number(i as i64 + 1),
                    geometry,
                    properties: props.as_object().cloned().unwrap_or_default(),
                })
                .collect(),
        )
    }

    fn to_json(bytes: &Bytes) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_feature_collection_shape() {
        let layer = parsed(vec![
            (
                Some(point!(x: 10.5, y: 55.25).into()),
                json!({"name": "a", "depth": 12}),
            ),
            (None, json!({"name": "b"})),
        ]);
        let metadata = LayerMetadata::new(&descriptor(GeometryKind::Point), &layer);

        let value = to_json(&serialize(&layer, &metadata, None).unwrap());
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["bbox"], json!([10.5, 55.25, 10.5, 55.25]));
        assert_eq!(value["features"][0]["id"], 1);
        assert_eq!(
            value["features"][0]["geometry"],
            json!({"type": "Point", "coordinates": [10.5, 55.25]})
        );
        assert_eq!(value["features"][0]["properties"]["depth"], 12);
        assert!(value["features"][1]["geometry"].is_null());
        assert_eq!(value["metadata"]["feature_count"], 2);
        assert_eq!(value["metadata"]["display_name"], "Habitats - Zones");
        assert_eq!(value["metadata"]["crs"], "EPSG:4326");
    }

    #[test]
    fn test_output_never_contains_path() {
        let layer = parsed(vec![(Some(point!(x: 1.0, y: 1.0).into()), json!({}))]);
        let metadata = LayerMetadata::new(&descriptor(GeometryKind::Point), &layer);
        let bytes = serialize(&layer, &metadata, None).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(!text.contains("/srv/data"));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let layer = parsed(vec![
            (Some(point!(x: 1.0, y: 2.0).into()), json!({"z": 1, "a": 2})),
            (Some(point!(x: 3.0, y: 4.0).into()), json!({"m": "x"})),
        ]);
        let metadata = LayerMetadata::new(&descriptor(GeometryKind::Point), &layer);
        assert_eq!(
            serialize(&layer, &metadata, None).unwrap(),
            serialize(&layer, &metadata, None).unwrap()
        );
    }

    #[test]
    fn test_polygon_rings_and_collection() {
        let square: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)
        ]
        .into();
        let json = serde_json::to_value(GeoJsonGeometry::from(&square)).unwrap();
        assert_eq!(json["type"], "Polygon");
        assert_eq!(json["coordinates"][0].as_array().unwrap().len(), 5);

        let collection = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            point!(x: 0.0, y: 0.0).into(),
            square,
        ]));
        let json = serde_json::to_value(GeoJsonGeometry::from(&collection)).unwrap();
        assert_eq!(json["type"], "GeometryCollection");
        assert_eq!(json["geometries"][1]["type"], "Polygon");
    }

    #[test]
    fn test_effective_tolerance() {
        assert_eq!(effective_tolerance(None), None);
        assert_eq!(effective_tolerance(Some(0.0)), None);
        assert_eq!(effective_tolerance(Some(-1.0)), None);
        assert_eq!(effective_tolerance(Some(f64::NAN)), None);
        assert_eq!(effective_tolerance(Some(0.01)), Some(0.01));
    }

    #[test]
    fn test_simplify_line_drops_near_collinear_vertices() {
        let line: Geometry<f64> =
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.001), (x: 2.0, y: 0.0)].into();
        match simplify_geometry(&line, 0.01) {
            Geometry::LineString(ls) => assert_eq!(ls.0.len(), 2),
            other => panic!("expected line string, got {:?}", other),
        }
    }

    #[test]
    fn test_simplify_keeps_collapsing_shell() {
        let tiny: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 0.001, y: 0.0), (x: 0.001, y: 0.001), (x: 0.0, y: 0.001), (x: 0.0, y: 0.0)
        ]
        .into();
        assert_eq!(simplify_geometry(&tiny, 1.0), tiny);
    }

    #[test]
    fn test_simplify_drops_collapsing_hole() {
        let with_hole: Geometry<f64> = polygon!(
            exterior: [
                (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)
            ],
            interiors: [[
                (x: 5.0, y: 5.0), (x: 5.01, y: 5.0), (x: 5.01, y: 5.01), (x: 5.0, y: 5.01), (x: 5.0, y: 5.0)
            ]],
        )
        .into();
        match simplify_geometry(&with_hole, 0.5) {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 5);
                assert!(p.interiors().is_empty());
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_points_are_not_simplified() {
        let pt: Geometry<f64> = point!(x: 1.23456, y: 6.54321).into();
        assert_eq!(simplify_geometry(&pt, 10.0), pt);
    }
}
