//! Lambert Conformal Conic projection (two standard parallels, ellipsoidal).
//!
//! Used for conformal pan-European mapping (ETRS89-LCC, EPSG:3034).
//! A cone secant to the ellipsoid along two standard parallels is unrolled
//! onto a plane.
//!
//! The projection parameters include:
//! - Latitude of false origin (lat0)
//! - Longitude of false origin / central meridian (lon0)
//! - Standard parallels: latin1 and latin2 (equal for a tangent cone)
//! - False easting and northing in meters

use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;

use crate::ellipsoid::{normalize_lon, Ellipsoid};
use crate::transform::{Projection, ProjectionError};

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian in degrees
    pub lon0: f64,
    /// Latitude of false origin in degrees
    pub lat0: f64,
    /// First standard parallel in degrees
    pub latin1: f64,
    /// Second standard parallel in degrees
    pub latin2: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Reference ellipsoid
    pub ellipsoid: Ellipsoid,
    /// Cone constant (n)
    n: f64,
    /// a·F, the scaled F constant
    af: f64,
    /// Rho at the false origin
    rho0: f64,
    e: f64,
}

impl LambertConformal {
    /// Create a projection from its defining parameters (degrees and meters).
    pub fn new(
        ellipsoid: Ellipsoid,
        lat0: f64,
        lon0: f64,
        latin1: f64,
        latin2: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e = ellipsoid.e();
        let phi1 = latin1.to_radians();
        let phi2 = latin2.to_radians();

        let m1 = m(phi1, e);
        let t1 = t(phi1, e);

        let n = if (phi1 - phi2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            phi1.sin()
        } else {
            // Secant cone (two standard parallels)
            (m1.ln() - m(phi2, e).ln()) / (t1.ln() - t(phi2, e).ln())
        };

        let af = ellipsoid.a * m1 / (n * t1.powf(n));
        let rho0 = af * t(lat0.to_radians(), e).powf(n);

        Self {
            lon0,
            lat0,
            latin1,
            latin2,
            false_easting,
            false_northing,
            ellipsoid,
            n,
            af,
            rho0,
            e,
        }
    }

    /// ETRS89 / LCC Europe (EPSG:3034).
    ///
    /// - Standard parallels: 35°N and 65°N
    /// - False origin: 52°N, 10°E at (4000000, 2800000)
    pub fn etrs89_europe() -> Self {
        Self::new(
            Ellipsoid::GRS80,
            52.0,          // lat0
            10.0,          // lon0
            35.0,          // latin1
            65.0,          // latin2
            4_000_000.0,   // false easting
            2_800_000.0,   // false northing
        )
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }
}

fn m(phi: f64, e: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e * e * s * s).sqrt()
}

fn t(phi: f64, e: f64) -> f64 {
    let s = phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - e * s) / (1.0 + e * s)).powf(e / 2.0)
}

impl Projection for LambertConformal {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }
        let phi = lat.to_radians();
        // The pole opposite the cone apex projects to infinity
        if (phi + self.n.signum() * FRAC_PI_2).abs() < 1e-10 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }

        let rho = self.af * t(phi, self.e).powf(self.n);
        let theta = self.n * normalize_lon(lon - self.lon0).to_radians();

        let x = self.false_easting + rho * theta.sin();
        let y = self.false_northing + self.rho0 - rho * theta.cos();
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);
        let sign = self.n.signum();

        let rho = sign * dx.hypot(dy);
        let t_val = (rho / self.af).powf(1.0 / self.n);
        let theta = (sign * dx).atan2(sign * dy);

        // Iterate for latitude
        let mut phi = FRAC_PI_2 - 2.0 * t_val.atan();
        for _ in 0..15 {
            let s = phi.sin();
            let next = FRAC_PI_2
                - 2.0 * (t_val * ((1.0 - self.e * s) / (1.0 + self.e * s)).powf(self.e / 2.0)).atan();
            let done = (next - phi).abs() < 1e-12;
            phi = next;
            if done {
                break;
            }
        }

        let lon = self.lon0 + (theta / self.n).to_degrees();
        let lat = phi.to_degrees();
        if !lat.is_finite() || !lon.is_finite() {
            return Err(ProjectionError::OutOfDomain { x, y });
        }
        Ok((normalize_lon(lon), lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_guidance_example() {
        // EPSG Guidance Note 7-2: NAD27 / Texas South Central, US survey feet
        let clarke_1866 = Ellipsoid {
            a: 6378206.4,
            f: 1.0 / 294.9786982,
        };
        let us_ft = 1200.0 / 3937.0;
        let lcc = LambertConformal::new(
            clarke_1866,
            27.0 + 50.0 / 60.0,
            -99.0,
            28.0 + 23.0 / 60.0,
            30.0 + 17.0 / 60.0,
            2_000_000.0 * us_ft,
            0.0,
        );

        let (x, y) = lcc.forward(-96.0, 28.5).unwrap();
        assert!((x / us_ft - 2_963_503.91).abs() < 0.01, "x = {}", x / us_ft);
        assert!((y / us_ft - 254_759.80).abs() < 0.01, "y = {}", y / us_ft);
    }

    #[test]
    fn test_false_origin() {
        let lcc = LambertConformal::etrs89_europe();
        let (x, y) = lcc.forward(10.0, 52.0).unwrap();
        assert!((x - 4_000_000.0).abs() < 1e-6);
        assert!((y - 2_800_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_etrs89_roundtrip() {
        let lcc = LambertConformal::etrs89_europe();
        for (lon, lat) in [(5.0, 50.0), (-20.0, 35.0), (30.0, 70.0), (40.0, 60.0)] {
            let (x, y) = lcc.forward(lon, lat).unwrap();
            let (lon2, lat2) = lcc.inverse(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-9, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_tangent_cone() {
        let lcc = LambertConformal::new(Ellipsoid::WGS84, 38.5, -97.5, 38.5, 38.5, 0.0, 0.0);
        assert!((lcc.cone_constant() - 38.5_f64.to_radians().sin()).abs() < 1e-12);

        let (x, y) = lcc.forward(-90.0, 42.0).unwrap();
        let (lon, lat) = lcc.inverse(x, y).unwrap();
        assert!((lon + 90.0).abs() < 1e-9);
        assert!((lat - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_south_pole_out_of_domain() {
        let lcc = LambertConformal::etrs89_europe();
        assert!(lcc.forward(10.0, -90.0).is_err());
    }
}
