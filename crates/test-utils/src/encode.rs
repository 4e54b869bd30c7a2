//! Geometry encoders for building fixture blobs.

use geo_types::{Coord, Geometry, LineString, Polygon};

const BYTE_ORDER_LE: u8 = 1;

/// Encode a geometry as 2D little-endian ISO WKB.
pub fn wkb(geometry: &Geometry<f64>) -> Vec<u8> {
    let mut buf = Vec::new();
    write_geometry(&mut buf, geometry);
    buf
}

/// Encode a geometry as a GeoPackage binary blob without envelope.
pub fn gpkg_blob(geometry: &Geometry<f64>, srs_id: i32) -> Vec<u8> {
    // magic, version 0, flags: little endian, no envelope
    let mut buf = vec![b'G', b'P', 0, 0x01];
    buf.extend_from_slice(&srs_id.to_le_bytes());
    write_geometry(&mut buf, geometry);
    buf
}

fn header(buf: &mut Vec<u8>, type_code: u32) {
    buf.push(BYTE_ORDER_LE);
    buf.extend_from_slice(&type_code.to_le_bytes());
}

fn coord(buf: &mut Vec<u8>, c: &Coord<f64>) {
    buf.extend_from_slice(&c.x.to_le_bytes());
    buf.extend_from_slice(&c.y.to_le_bytes());
}

fn coords(buf: &mut Vec<u8>, line: &LineString<f64>) {
    buf.extend_from_slice(&(line.0.len() as u32).to_le_bytes());
    for c in &line.0 {
        coord(buf, c);
    }
}

fn polygon_body(buf: &mut Vec<u8>, polygon: &Polygon<f64>) {
    let rings = 1 + polygon.interiors().len();
    buf.extend_from_slice(&(rings as u32).to_le_bytes());
    coords(buf, polygon.exterior());
    for ring in polygon.interiors() {
        coords(buf, ring);
    }
}

fn write_geometry(buf: &mut Vec<u8>, geometry: &Geometry<f64>) {
    match geometry {
        Geometry::Point(p) => {
            header(buf, 1);
            coord(buf, &p.0);
        }
        Geometry::LineString(ls) => {
            header(buf, 2);
            coords(buf, ls);
        }
        Geometry::Line(line) => {
            header(buf, 2);
            coords(buf, &LineString(vec![line.start, line.end]));
        }
        Geometry::Polygon(p) => {
            header(buf, 3);
            polygon_body(buf, p);
        }
        Geometry::Rect(r) => write_geometry(buf, &Geometry::Polygon(r.to_polygon())),
        Geometry::Triangle(t) => write_geometry(buf, &Geometry::Polygon(t.to_polygon())),
        Geometry::MultiPoint(mp) => {
            header(buf, 4);
            buf.extend_from_slice(&(mp.0.len() as u32).to_le_bytes());
            for p in &mp.0 {
                header(buf, 1);
                coord(buf, &p.0);
            }
        }
        Geometry::MultiLineString(mls) => {
            header(buf, 5);
            buf.extend_from_slice(&(mls.0.len() as u32).to_le_bytes());
            for ls in &mls.0 {
                header(buf, 2);
                coords(buf, ls);
            }
        }
        Geometry::MultiPolygon(mp) => {
            header(buf, 6);
            buf.extend_from_slice(&(mp.0.len() as u32).to_le_bytes());
            for p in &mp.0 {
                header(buf, 3);
                polygon_body(buf, p);
            }
        }
        Geometry::GeometryCollection(gc) => {
            header(buf, 7);
            buf.extend_from_slice(&(gc.0.len() as u32).to_le_bytes());
            for g in &gc.0 {
                write_geometry(buf, g);
            }
        }
    }
}
