//! GeoPackage binary geometry encoding (StandardGeoPackageBinary).
//!
//! A geometry blob is a small header followed by WKB:
//!
//! ```text
//! Bytes 0-1: magic "GP"
//! Byte 2:    version (0 = version 1)
//! Byte 3:    flags
//!              bit 0:    header byte order (1 = little endian)
//!              bits 1-3: envelope contents indicator
//!              bit 4:    empty geometry
//!              bit 5:    extended GeoPackage binary
//! Bytes 4-7: srs_id (int32)
//! Bytes 8-:  envelope (0, 32, 48 or 64 bytes), then WKB
//! ```

use geo_types::Geometry;

use crate::error::{GpkgError, GpkgResult};
use crate::wkb;

/// Parsed GeoPackage binary header.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryHeader {
    pub version: u8,
    pub srs_id: i32,
    pub empty: bool,
    pub extended: bool,
    /// Total header length in bytes, envelope included
    pub length: usize,
}

fn envelope_len(indicator: u8) -> GpkgResult<usize> {
    match indicator {
        0 => Ok(0),
        1 => Ok(32),
        2 | 3 => Ok(48),
        4 => Ok(64),
        other => Err(GpkgError::invalid(format!(
            "invalid envelope indicator {}",
            other
        ))),
    }
}

/// Parse the header at the start of a geometry blob.
pub fn parse_header(data: &[u8]) -> GpkgResult<GeometryHeader> {
    if data.len() < 8 {
        return Err(GpkgError::invalid("blob shorter than GeoPackage header"));
    }
    if &data[0..2] != b"GP" {
        return Err(GpkgError::invalid("missing GP magic"));
    }

    let version = data[2];
    let flags = data[3];
    let little_endian = flags & 0x01 != 0;
    let indicator = (flags >> 1) & 0x07;
    let empty = flags & 0x10 != 0;
    let extended = flags & 0x20 != 0;

    let srs_bytes = [data[4], data[5], data[6], data[7]];
    let srs_id = if little_endian {
        i32::from_le_bytes(srs_bytes)
    } else {
        i32::from_be_bytes(srs_bytes)
    };

    let length = 8 + envelope_len(indicator)?;
    if data.len() < length {
        return Err(GpkgError::invalid("blob shorter than declared envelope"));
    }

    Ok(GeometryHeader {
        version,
        srs_id,
        empty,
        extended,
        length,
    })
}

/// Decode a geometry column value.
///
/// Returns `None` for empty geometries. Blobs without the GeoPackage magic
/// are decoded as bare WKB.
pub fn decode_geometry(data: &[u8]) -> GpkgResult<Option<Geometry<f64>>> {
    if !data.starts_with(b"GP") {
        return wkb::decode(data);
    }

    let header = parse_header(data)?;
    if header.extended {
        return Err(GpkgError::invalid("extended GeoPackage geometry is not supported"));
    }
    if header.empty {
        return Ok(None);
    }
    wkb::decode(&data[header.length..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;

    fn point_wkb(x: f64, y: f64) -> Vec<u8> {
        let mut buf = vec![1u8];
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
        buf
    }

    #[test]
    fn test_header_without_envelope() {
        let mut blob = vec![b'G', b'P', 0, 0x01];
        blob.extend_from_slice(&4326i32.to_le_bytes());
        blob.extend(point_wkb(1.0, 2.0));

        let header = parse_header(&blob).unwrap();
        assert_eq!(header.srs_id, 4326);
        assert_eq!(header.length, 8);
        assert!(!header.empty);

        let g = decode_geometry(&blob).unwrap().unwrap();
        assert_eq!(g, Geometry::Point(point!(x: 1.0, y: 2.0)));
    }

    #[test]
    fn test_header_big_endian_with_xy_envelope() {
        // byte order bit clear, envelope indicator 1
        let mut blob = vec![b'G', b'P', 0, 0x02];
        blob.extend_from_slice(&3035i32.to_be_bytes());
        for v in [4_000_000.0f64, 4_000_000.0, 3_000_000.0, 3_000_000.0] {
            blob.extend_from_slice(&v.to_be_bytes());
        }
        blob.extend(point_wkb(4_000_000.0, 3_000_000.0));

        let header = parse_header(&blob).unwrap();
        assert_eq!(header.srs_id, 3035);
        assert_eq!(header.length, 40);

        let g = decode_geometry(&blob).unwrap().unwrap();
        assert_eq!(g, Geometry::Point(point!(x: 4_000_000.0, y: 3_000_000.0)));
    }

    #[test]
    fn test_empty_flag() {
        let mut blob = vec![b'G', b'P', 0, 0x11];
        blob.extend_from_slice(&4326i32.to_le_bytes());
        blob.extend(point_wkb(f64::NAN, f64::NAN));
        assert!(decode_geometry(&blob).unwrap().is_none());
    }

    #[test]
    fn test_invalid_envelope_indicator() {
        let mut blob = vec![b'G', b'P', 0, 0x0B];
        blob.extend_from_slice(&0i32.to_le_bytes());
        assert!(parse_header(&blob).is_err());
    }

    #[test]
    fn test_bare_wkb_fallback() {
        let g = decode_geometry(&point_wkb(3.0, 4.0)).unwrap().unwrap();
        assert_eq!(g, Geometry::Point(point!(x: 3.0, y: 4.0)));
    }
}
