//! Well-Known Binary geometry decoding.
//!
//! Accepts ISO WKB (Z/M/ZM type codes 1001-3007) and PostGIS extended WKB
//! (high-bit dimension flags and embedded SRID). Z and M ordinates are read
//! and discarded so every decoded geometry is two-dimensional.

use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};

use crate::error::{GpkgError, GpkgResult};

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Collections nested deeper than this are rejected.
const MAX_DEPTH: usize = 32;

/// Decode a WKB buffer into a 2D geometry.
///
/// An empty point (NaN coordinates) decodes to `None`.
pub fn decode(data: &[u8]) -> GpkgResult<Option<Geometry<f64>>> {
    let mut cursor = Cursor::new(data);
    let geometry = cursor.geometry(0)?;
    if cursor.remaining() != 0 {
        return Err(GpkgError::invalid(format!(
            "{} trailing bytes after geometry",
            cursor.remaining()
        )));
    }
    Ok(geometry)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    little_endian: bool,
}

struct Header {
    geometry_type: u32,
    dims: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            little_endian: true,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> GpkgResult<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or_else(|| GpkgError::invalid("unexpected end of WKB"))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u32(&mut self) -> GpkgResult<u32> {
        let bytes = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn read_f64(&mut self) -> GpkgResult<f64> {
        let bytes = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }

    /// Element count, bounded by what the remaining bytes could hold.
    fn read_count(&mut self, min_element_size: usize) -> GpkgResult<usize> {
        let count = self.read_u32()? as usize;
        if count.saturating_mul(min_element_size) > self.remaining() {
            return Err(GpkgError::invalid(format!(
                "element count {} exceeds remaining data",
                count
            )));
        }
        Ok(count)
    }

    // Byte 0: byte order (0 = big endian, 1 = little endian)
    // Bytes 1-4: geometry type, possibly with ISO dimension offset or EWKB flags
    // Bytes 5-8: SRID, only when the EWKB SRID flag is set
    fn header(&mut self) -> GpkgResult<Header> {
        let [order] = self.take::<1>()?;
        self.little_endian = match order {
            0 => false,
            1 => true,
            other => return Err(GpkgError::invalid(format!("bad byte order marker {}", other))),
        };

        let raw = self.read_u32()?;
        let mut has_z = raw & EWKB_Z != 0;
        let mut has_m = raw & EWKB_M != 0;
        if raw & EWKB_SRID != 0 {
            self.read_u32()?;
        }

        let code = raw & 0x0FFF_FFFF;
        match code / 1000 {
            0 => {}
            1 => has_z = true,
            2 => has_m = true,
            3 => {
                has_z = true;
                has_m = true;
            }
            _ => return Err(GpkgError::UnsupportedGeometryType(raw)),
        }

        Ok(Header {
            geometry_type: code % 1000,
            dims: 2 + has_z as usize + has_m as usize,
        })
    }

    fn coord(&mut self, dims: usize) -> GpkgResult<Coord<f64>> {
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        for _ in 2..dims {
            self.read_f64()?;
        }
        Ok(Coord { x, y })
    }

    fn coords(&mut self, dims: usize) -> GpkgResult<Vec<Coord<f64>>> {
        let n = self.read_count(dims * 8)?;
        (0..n).map(|_| self.coord(dims)).collect()
    }

    fn point(&mut self, dims: usize) -> GpkgResult<Option<Point<f64>>> {
        let c = self.coord(dims)?;
        if c.x.is_nan() && c.y.is_nan() {
            Ok(None)
        } else {
            Ok(Some(Point(c)))
        }
    }

    fn polygon(&mut self, dims: usize) -> GpkgResult<Polygon<f64>> {
        let rings = self.read_count(4)?;
        let mut parsed: Vec<LineString<f64>> = Vec::with_capacity(rings);
        for _ in 0..rings {
            parsed.push(LineString(self.coords(dims)?));
        }
        let mut iter = parsed.into_iter();
        let exterior = iter.next().unwrap_or_else(|| LineString(Vec::new()));
        Ok(Polygon::new(exterior, iter.collect()))
    }

    /// Read a nested member and check it has the expected type.
    fn member(&mut self, expected: u32) -> GpkgResult<Header> {
        let header = self.header()?;
        if header.geometry_type != expected {
            return Err(GpkgError::invalid(format!(
                "expected member type {}, found {}",
                expected, header.geometry_type
            )));
        }
        Ok(header)
    }

    fn geometry(&mut self, depth: usize) -> GpkgResult<Option<Geometry<f64>>> {
        if depth > MAX_DEPTH {
            return Err(GpkgError::invalid("geometry collection nested too deeply"));
        }
        let header = self.header()?;
        let dims = header.dims;

        let geometry = match header.geometry_type {
            1 => return Ok(self.point(dims)?.map(Geometry::Point)),
            2 => Geometry::LineString(LineString(self.coords(dims)?)),
            3 => Geometry::Polygon(self.polygon(dims)?),
            4 => {
                let n = self.read_count(5)?;
                let mut points = Vec::with_capacity(n);
                for _ in 0..n {
                    let member = self.member(1)?;
                    if let Some(p) = self.point(member.dims)? {
                        points.push(p);
                    }
                }
                Geometry::MultiPoint(MultiPoint(points))
            }
            5 => {
                let n = self.read_count(9)?;
                let mut lines = Vec::with_capacity(n);
                for _ in 0..n {
                    let member = self.member(2)?;
                    lines.push(LineString(self.coords(member.dims)?));
                }
                Geometry::MultiLineString(MultiLineString(lines))
            }
            6 => {
                let n = self.read_count(9)?;
                let mut polygons = Vec::with_capacity(n);
                for _ in 0..n {
                    let member = self.member(3)?;
                    polygons.push(self.polygon(member.dims)?);
                }
                Geometry::MultiPolygon(MultiPolygon(polygons))
            }
            7 => {
                let n = self.read_count(5)?;
                let mut members = Vec::with_capacity(n);
                for _ in 0..n {
                    if let Some(g) = self.geometry(depth + 1)? {
                        members.push(g);
                    }
                }
                Geometry::GeometryCollection(GeometryCollection(members))
            }
            _ => return Err(GpkgError::UnsupportedGeometryType(header.geometry_type)),
        };
        Ok(Some(geometry))
    }
}
