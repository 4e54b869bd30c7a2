//! Shared test utilities for the marine vector workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A GeoPackage fixture writer
//! - WKB and GeoPackage binary geometry encoders
//! - Temporary data directories with helpers for corrupt files and mtime bumps
//!
//! # Usage
//!
//! ```ignore
//! use test_utils::{fixtures, GpkgFixture, TestDataDir};
//!
//! let dir = TestDataDir::new();
//! GpkgFixture::new()
//!     .layer(fixtures::square_layer("zones", 3, 10.0, 55.0))
//!     .write(&dir.file("habitats.gpkg"))
//!     .await?;
//! ```

pub mod encode;
pub mod fixtures;
pub mod gpkg;
pub mod paths;

pub use encode::{gpkg_blob, wkb};
pub use gpkg::{FixtureLayer, GpkgFixture};
pub use paths::*;

/// Macro for approximate floating-point equality assertions.
///
/// ```ignore
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
