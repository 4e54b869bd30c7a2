//! Common test fixtures for vector layer tests.
//!
//! Layers are generated deterministically so tests can assert exact feature
//! counts and extents.

use geo_types::{line_string, point, polygon, Geometry};
use serde_json::json;

use crate::gpkg::FixtureLayer;

/// Common bounding box definitions for testing.
pub mod bbox {
    /// Baltic Sea
    pub const BALTIC: (f64, f64, f64, f64) = (9.0, 53.0, 30.0, 66.0);

    /// North Sea
    pub const NORTH_SEA: (f64, f64, f64, f64) = (-4.0, 51.0, 9.0, 61.0);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (0.0, 0.0, 0.0, 0.0);
}

/// Identifiers that must never resolve to a layer.
pub const HOSTILE_IDENTIFIERS: [&str; 8] = [
    "../etc/passwd",
    "../../secret.gpkg/merged",
    "/etc/passwd",
    "habitats.gpkg/../habitats.gpkg/zones",
    "habitats.gpkg/zones\0",
    "C:\\Windows\\system.ini",
    "",
    "habitats.gpkg//zones",
];

/// A unit square with its lower-left corner at (x, y).
pub fn square(x: f64, y: f64, size: f64) -> Geometry<f64> {
    polygon![
        (x: x, y: y),
        (x: x + size, y: y),
        (x: x + size, y: y + size),
        (x: x, y: y + size),
        (x: x, y: y),
    ]
    .into()
}

/// `count` EPSG:4326 squares of 0.5° laid out eastward from (x, y).
pub fn square_layer(name: &str, count: usize, x: f64, y: f64) -> FixtureLayer {
    (0..count).fold(FixtureLayer::new(name, "POLYGON", 4326), |layer, i| {
        layer.feature(
            square(x + i as f64, y, 0.5),
            json!({ "name": format!("{}-{}", name, i + 1), "depth_m": (i as i64 + 1) * 10 }),
        )
    })
}

/// `count` EPSG:4326 points laid out northward from (x, y).
pub fn point_layer(name: &str, count: usize, x: f64, y: f64) -> FixtureLayer {
    (0..count).fold(FixtureLayer::new(name, "POINT", 4326), |layer, i| {
        layer.feature(
            point!(x: x, y: y + i as f64 * 0.1),
            json!({ "station": format!("ST{:03}", i + 1) }),
        )
    })
}

/// `count` two-vertex EPSG:4326 lines starting at (x, y).
pub fn line_layer(name: &str, count: usize, x: f64, y: f64) -> FixtureLayer {
    (0..count).fold(FixtureLayer::new(name, "LINESTRING", 4326), |layer, i| {
        let offset = i as f64 * 0.2;
        layer.feature(
            line_string![(x: x, y: y + offset), (x: x + 1.0, y: y + offset + 0.5)],
            json!({ "cable_id": i as i64 + 1 }),
        )
    })
}
