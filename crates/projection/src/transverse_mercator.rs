//! Transverse Mercator using Krüger's series in the third flattening.
//!
//! Accurate to well under a millimeter within a UTM zone and still
//! sub-meter several zones away from the central meridian.

use crate::ellipsoid::{normalize_lon, Ellipsoid};
use crate::transform::{Projection, ProjectionError};

/// A Transverse Mercator projection on an ellipsoid.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian (degrees)
    pub lon0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,

    // Derived series coefficients
    e: f64,
    rectifying_radius: f64,
    alpha: [f64; 4],
    beta: [f64; 4],
    delta: [f64; 4],
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.n();
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;

        let rectifying_radius = ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0,
            49561.0 * n4 / 161280.0,
        ];
        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0,
            4397.0 * n4 / 161280.0,
        ];
        let delta = [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3 + 116.0 * n4 / 45.0,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0 - 227.0 * n4 / 45.0,
            56.0 * n3 / 15.0 - 136.0 * n4 / 35.0,
            4279.0 * n4 / 630.0,
        ];

        Self {
            lon0,
            k0,
            false_easting,
            false_northing,
            e: ellipsoid.e(),
            rectifying_radius,
            alpha,
            beta,
            delta,
        }
    }

    /// Universal Transverse Mercator zone (1-60) on the given ellipsoid.
    pub fn utm(ellipsoid: Ellipsoid, zone: u8, north: bool) -> Self {
        let lon0 = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
        let false_northing = if north { 0.0 } else { 10_000_000.0 };
        Self::new(ellipsoid, lon0, 0.9996, 500_000.0, false_northing)
    }
}

impl Projection for TransverseMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }
        let phi = lat.to_radians();
        let dlambda = normalize_lon(lon - self.lon0).to_radians();

        // Conformal latitude
        let s = phi.sin();
        let t = (s.atanh() - self.e * (self.e * s).atanh()).sinh();

        let xi_p = t.atan2(dlambda.cos());
        let eta_p = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();
        if !eta_p.is_finite() {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let x = self.false_easting + self.k0 * self.rectifying_radius * eta;
        let y = self.false_northing + self.k0 * self.rectifying_radius * xi;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let xi = (y - self.false_northing) / (self.k0 * self.rectifying_radius);
        let eta = (x - self.false_easting) / (self.k0 * self.rectifying_radius);

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut phi = chi;
        for (j, d) in self.delta.iter().enumerate() {
            phi += d * (2.0 * (j as f64 + 1.0) * chi).sin();
        }
        let dlambda = eta_p.sinh().atan2(xi_p.cos());

        let lat = phi.to_degrees();
        let lon = normalize_lon(self.lon0 + dlambda.to_degrees());
        if !lat.is_finite() || !lon.is_finite() {
            return Err(ProjectionError::OutOfDomain { x, y });
        }
        Ok((lon, lat))
    }
}
