//! Lambert Azimuthal Equal Area, oblique ellipsoidal form.
//!
//! Used for pan-European statistical and habitat datasets (ETRS89-LAEA, EPSG:3035).
//! Formulas follow Snyder, "Map Projections: A Working Manual", pp. 187-190.

use std::f64::consts::FRAC_PI_2;

use crate::ellipsoid::{normalize_lon, Ellipsoid};
use crate::transform::{Projection, ProjectionError};

const MAX_ITERATIONS: usize = 15;
const CONVERGENCE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct LambertAzimuthalEqualArea {
    /// Latitude of natural origin (degrees)
    pub lat0: f64,
    /// Longitude of natural origin (degrees)
    pub lon0: f64,
    pub false_easting: f64,
    pub false_northing: f64,

    e: f64,
    e2: f64,
    qp: f64,
    rq: f64,
    beta1: f64,
    d: f64,
}

impl LambertAzimuthalEqualArea {
    pub fn new(
        ellipsoid: Ellipsoid,
        lat0: f64,
        lon0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e2 = ellipsoid.e2();
        let e = ellipsoid.e();
        let phi0 = lat0.to_radians();

        let qp = authalic_q(FRAC_PI_2, e, e2);
        let rq = ellipsoid.a * (qp / 2.0).sqrt();
        let beta1 = (authalic_q(phi0, e, e2) / qp).asin();
        let sin0 = phi0.sin();
        let d = ellipsoid.a * (phi0.cos() / (1.0 - e2 * sin0 * sin0).sqrt()) / (rq * beta1.cos());

        Self {
            lat0,
            lon0,
            false_easting,
            false_northing,
            e,
            e2,
            qp,
            rq,
            beta1,
            d,
        }
    }

    /// ETRS89 / LAEA Europe (EPSG:3035).
    pub fn etrs89_europe() -> Self {
        Self::new(Ellipsoid::GRS80, 52.0, 10.0, 4_321_000.0, 3_210_000.0)
    }
}

/// Snyder's q(φ), eq. 3-12.
fn authalic_q(phi: f64, e: f64, e2: f64) -> f64 {
    let s = phi.sin();
    (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
}

impl Projection for LambertAzimuthalEqualArea {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }
        let phi = lat.to_radians();
        let lambda = normalize_lon(lon - self.lon0).to_radians();

        let q = authalic_q(phi, self.e, self.e2);
        let beta = (q / self.qp).clamp(-1.0, 1.0).asin();

        let denom = 1.0
            + self.beta1.sin() * beta.sin()
            + self.beta1.cos() * beta.cos() * lambda.cos();
        // Antipode of the origin
        if denom <= 1e-12 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }
        let b = self.rq * (2.0 / denom).sqrt();

        let x = self.false_easting + b * self.d * beta.cos() * lambda.sin();
        let y = self.false_northing
            + (b / self.d)
                * (self.beta1.cos() * beta.sin() - self.beta1.sin() * beta.cos() * lambda.cos());
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let dx = x - self.false_easting;
        let dy = y - self.false_northing;

        let rho = (dx / self.d).hypot(self.d * dy);
        if rho < 1e-9 {
            return Ok((self.lon0, self.lat0));
        }
        let ratio = rho / (2.0 * self.rq);
        if ratio > 1.0 {
            return Err(ProjectionError::OutOfDomain { x, y });
        }
        let c = 2.0 * ratio.asin();

        let beta_p = (c.cos() * self.beta1.sin() + self.d * dy * c.sin() * self.beta1.cos() / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lambda = (dx * c.sin()).atan2(
            self.d * rho * self.beta1.cos() * c.cos()
                - self.d * self.d * dy * self.beta1.sin() * c.sin(),
        );

        // Snyder eq. 3-16, iterated from the authalic latitude
        let q = self.qp * beta_p.sin();
        let mut phi = (q / 2.0).asin();
        for _ in 0..MAX_ITERATIONS {
            let s = phi.sin();
            let one_minus = 1.0 - self.e2 * s * s;
            let next = phi
                + one_minus * one_minus / (2.0 * phi.cos())
                    * (q / (1.0 - self.e2) - s / one_minus
                        + (1.0 / (2.0 * self.e)) * ((1.0 - self.e * s) / (1.0 + self.e * s)).ln());
            let done = (next - phi).abs() < CONVERGENCE;
            phi = next;
            if done {
                break;
            }
        }
        if !phi.is_finite() {
            return Err(ProjectionError::OutOfDomain { x, y });
        }

        Ok((normalize_lon(self.lon0 + lambda.to_degrees()), phi.to_degrees()))
    }
}
