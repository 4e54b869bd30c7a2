//! GeoPackage (OGC 12-128r18) reader.
//!
//! Lists the feature layers of a GeoPackage container without touching
//! geometry, and extracts a single layer's features with geometry decoded
//! from the GeoPackage binary encoding into `geo_types`.
//!
//! Files are always opened read-only.

pub mod binary;
pub mod error;
pub mod reader;
pub mod wkb;

pub use error::{GpkgError, GpkgResult};
pub use reader::{kind_of, list_layers, read_layer, Feature, GeoPackage, LayerInfo};
