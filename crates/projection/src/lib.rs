//! Coordinate reference system transformations.
//!
//! Implements the map projections used by marine vector datasets from scratch,
//! and the normalizer that brings any supported source CRS into the canonical
//! display CRS (EPSG:4326).

pub mod ellipsoid;
pub mod laea;
pub mod lambert;
pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use ellipsoid::Ellipsoid;
pub use laea::LambertAzimuthalEqualArea;
pub use lambert::LambertConformal;
pub use mercator::WebMercator;
pub use transform::{CrsTransform, Projection, ProjectionError};
pub use transverse_mercator::TransverseMercator;
