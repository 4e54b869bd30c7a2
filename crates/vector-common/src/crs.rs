//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EPSG-registered coordinate reference system.
///
/// All geometry leaving the engine is expressed in [`CrsCode::CANONICAL`]
/// (WGS84 longitude/latitude).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CrsCode(u32);

impl CrsCode {
    /// WGS84 geographic, the canonical display CRS.
    pub const CANONICAL: CrsCode = CrsCode(4326);
    /// Web Mercator.
    pub const WEB_MERCATOR: CrsCode = CrsCode(3857);

    pub const fn epsg(code: u32) -> Self {
        Self(code)
    }

    /// Numeric EPSG code.
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Parse a CRS string as found in configuration or container metadata.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84" / "OGC:CRS84" (equivalent to EPSG:4326)
    /// - "urn:ogc:def:crs:EPSG::3035"
    /// - "EPSG:900913" (legacy alias of EPSG:3857)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "CRS:84" | "OGC:CRS84" | "URN:OGC:DEF:CRS:OGC:1.3:CRS84" => {
                return Ok(Self::CANONICAL)
            }
            "EPSG:900913" => return Ok(Self::WEB_MERCATOR),
            _ => {}
        }

        let digits = normalized
            .strip_prefix("EPSG:")
            .or_else(|| normalized.strip_prefix("URN:OGC:DEF:CRS:EPSG::"))
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        digits
            .parse::<u32>()
            .map(CrsCode)
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// Build a code from a GeoPackage `gpkg_spatial_ref_sys` row.
    ///
    /// Only the EPSG organization is understood. The legacy 900913 id is
    /// folded into [`CrsCode::WEB_MERCATOR`] like in [`CrsCode::parse`].
    pub fn from_organization(organization: &str, id: i64) -> Result<Self, CrsParseError> {
        if !organization.eq_ignore_ascii_case("EPSG") {
            return Err(CrsParseError::UnsupportedCrs(format!("{}:{}", organization, id)));
        }
        match u32::try_from(id) {
            Ok(900913) => Ok(Self::WEB_MERCATOR),
            Ok(code) => Ok(CrsCode(code)),
            Err(_) => Err(CrsParseError::UnsupportedCrs(format!("{}:{}", organization, id))),
        }
    }

    /// True for the canonical display CRS.
    pub fn is_canonical(&self) -> bool {
        *self == Self::CANONICAL
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CrsCode::parse(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::CANONICAL);
        assert_eq!(CrsCode::parse("epsg:3035").unwrap(), CrsCode::epsg(3035));
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::CANONICAL);
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:EPSG::32633").unwrap(),
            CrsCode::epsg(32633)
        );
        assert_eq!(CrsCode::parse("EPSG:900913").unwrap(), CrsCode::WEB_MERCATOR);
        assert!(CrsCode::parse("ESRI:102001").is_err());
        assert!(CrsCode::parse("EPSG:abc").is_err());
    }

    #[test]
    fn test_from_organization() {
        assert_eq!(
            CrsCode::from_organization("epsg", 4326).unwrap(),
            CrsCode::CANONICAL
        );
        assert_eq!(
            CrsCode::from_organization("EPSG", 900913).unwrap(),
            CrsCode::WEB_MERCATOR
        );
        assert!(CrsCode::from_organization("NONE", 0).is_err());
        assert!(CrsCode::from_organization("EPSG", -1).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&CrsCode::epsg(3857)).unwrap();
        assert_eq!(json, "\"EPSG:3857\"");
        let back: CrsCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CrsCode::WEB_MERCATOR);
    }
}
