//! Common types shared by the vector layer engine and its HTTP service.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod layer;
pub mod style;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use error::{VectorError, VectorResult};
pub use layer::{
    display_name, BoundsSummary, GeometryFamily, GeometryKind, LayerKey, LayerStatus,
    LayerSummary, MERGED_LAYER_NAME,
};
pub use style::LayerStyle;
