//! Spherical (Web) Mercator, EPSG:3857.

use std::f64::consts::PI;

use crate::ellipsoid::normalize_lon;
use crate::transform::{Projection, ProjectionError};

/// Latitude limit where Web Mercator becomes square (≈ ±85.0511°).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Web Mercator on a sphere of radius equal to the WGS84 semi-major axis.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    radius: f64,
}

impl WebMercator {
    pub fn new() -> Self {
        Self { radius: 6378137.0 }
    }

    /// Half the projected world width in meters (20037508.34...).
    pub fn max_extent(&self) -> f64 {
        self.radius * PI
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new()
    }
}

impl Projection for WebMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = self.radius * lon.to_radians();
        let y = self.radius * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();
        Ok((normalize_lon(lon), lat))
    }
}
