//! CRS normalization of whole geometries.
//!
//! [`CrsTransform`] resolves a source [`CrsCode`] to a projection and maps
//! every coordinate of a geometry into the canonical CRS (and back).

use std::sync::Arc;

use geo::MapCoords;
use geo_types::{Coord, Geometry};
use thiserror::Error;
use vector_common::{CrsCode, VectorError};

use crate::ellipsoid::Ellipsoid;
use crate::laea::LambertAzimuthalEqualArea;
use crate::lambert::LambertConformal;
use crate::mercator::WebMercator;
use crate::transverse_mercator::TransverseMercator;

/// Errors raised while projecting coordinates.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(CrsCode),

    #[error("Coordinate ({x}, {y}) is outside the projection domain")]
    OutOfDomain { x: f64, y: f64 },

    #[error("Non-finite coordinate")]
    NonFinite,
}

impl From<ProjectionError> for VectorError {
    fn from(err: ProjectionError) -> Self {
        let crs = match &err {
            ProjectionError::UnsupportedCrs(code) => code.to_string(),
            _ => "source CRS".to_string(),
        };
        VectorError::reprojection(crs, err)
    }
}

/// A map projection between geographic degrees and projected meters.
pub trait Projection: std::fmt::Debug + Send + Sync {
    /// Geographic (lon, lat) in degrees to projected (x, y).
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError>;

    /// Projected (x, y) to geographic (lon, lat) in degrees.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError>;
}

/// Geographic CRSs whose datum is treated as WGS84 at display precision.
const GEOGRAPHIC_EQUIVALENTS: [u32; 3] = [4326, 4258, 4269];

/// Every source CRS the normalizer understands, as EPSG codes.
pub fn supported_crs() -> Vec<CrsCode> {
    let mut codes: Vec<CrsCode> = GEOGRAPHIC_EQUIVALENTS.iter().map(|c| CrsCode::epsg(*c)).collect();
    codes.extend([
        CrsCode::WEB_MERCATOR,
        CrsCode::epsg(900913),
        CrsCode::epsg(3035),
        CrsCode::epsg(3034),
    ]);
    codes.extend((32601..=32660).map(CrsCode::epsg));
    codes.extend((32701..=32760).map(CrsCode::epsg));
    codes.extend((25828..=25838).map(CrsCode::epsg));
    codes
}

fn projection_for(crs: CrsCode) -> Result<Option<Arc<dyn Projection>>, ProjectionError> {
    let code = crs.code();
    let projection: Arc<dyn Projection> = match code {
        c if GEOGRAPHIC_EQUIVALENTS.contains(&c) => return Ok(None),
        3857 | 900913 => Arc::new(WebMercator::new()),
        3035 => Arc::new(LambertAzimuthalEqualArea::etrs89_europe()),
        3034 => Arc::new(LambertConformal::etrs89_europe()),
        32601..=32660 => Arc::new(TransverseMercator::utm(Ellipsoid::WGS84, (code - 32600) as u8, true)),
        32701..=32760 => Arc::new(TransverseMercator::utm(Ellipsoid::WGS84, (code - 32700) as u8, false)),
        25828..=25838 => Arc::new(TransverseMercator::utm(Ellipsoid::GRS80, (code - 25800) as u8, true)),
        _ => return Err(ProjectionError::UnsupportedCrs(crs)),
    };
    Ok(Some(projection))
}

/// Transformation between one source CRS and the canonical CRS.
#[derive(Debug, Clone)]
pub struct CrsTransform {
    source: CrsCode,
    projection: Option<Arc<dyn Projection>>,
}

impl CrsTransform {
    /// Resolve a source CRS, failing for codes outside [`supported_crs`].
    pub fn new(source: CrsCode) -> Result<Self, ProjectionError> {
        Ok(Self {
            source,
            projection: projection_for(source)?,
        })
    }

    pub fn source(&self) -> CrsCode {
        self.source
    }

    /// True when coordinates pass through unchanged.
    pub fn is_identity(&self) -> bool {
        self.projection.is_none()
    }

    /// Map a geometry from the source CRS into the canonical CRS.
    pub fn to_canonical(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>, ProjectionError> {
        match &self.projection {
            None => Ok(geometry.clone()),
            Some(projection) => geometry.try_map_coords(|c: Coord<f64>| {
                let (lon, lat) = projection.inverse(c.x, c.y)?;
                finite(lon, lat)
            }),
        }
    }

    /// Map a canonical geometry into the source CRS.
    pub fn from_canonical(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>, ProjectionError> {
        match &self.projection {
            None => Ok(geometry.clone()),
            Some(projection) => geometry.try_map_coords(|c: Coord<f64>| {
                let (x, y) = projection.forward(c.x, c.y)?;
                finite(x, y)
            }),
        }
    }
}

fn finite(x: f64, y: f64) -> Result<Coord<f64>, ProjectionError> {
    if x.is_finite() && y.is_finite() {
        Ok(Coord { x, y })
    } else {
        Err(ProjectionError::NonFinite)
    }
}
