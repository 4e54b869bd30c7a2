//! Layer listing and feature extraction over SQLite.

use std::path::Path;

use geo_types::Geometry;
use serde_json::{Map, Number, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, FromRow, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

use vector_common::{CrsCode, GeometryKind};

use crate::binary::decode_geometry;
use crate::error::{GpkgError, GpkgResult};

/// Metadata for one feature layer, read from the GeoPackage system tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    /// Table name of the layer
    pub name: String,
    pub geometry_column: String,
    pub kind: GeometryKind,
    /// `srs_id` as declared in `gpkg_geometry_columns`
    pub srs_id: i64,
    /// EPSG code of the layer SRS, `None` when the organization is not EPSG
    pub crs: Option<CrsCode>,
}

/// One row of a feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Primary key value, or the 1-based row position when the table has none
    pub id: i64,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

#[derive(FromRow)]
struct GeometryColumnRow {
    table_name: String,
    column_name: String,
    geometry_type_name: String,
    srs_id: i64,
}

/// An open, read-only GeoPackage.
pub struct GeoPackage {
    pool: SqlitePool,
}

impl GeoPackage {
    /// Open a container read-only. Fails when the file does not exist.
    pub async fn open(path: &Path) -> GpkgResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| GpkgError::Open(e.to_string()))?;

        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// List feature layers in table-name order. Layers whose geometry type
    /// cannot be determined are skipped with a warning.
    pub async fn layers(&self) -> GpkgResult<Vec<LayerInfo>> {
        let rows = sqlx::query_as::<_, GeometryColumnRow>(
            r#"
            SELECT g.table_name, g.column_name, g.geometry_type_name, g.srs_id
            FROM gpkg_contents c
            JOIN gpkg_geometry_columns g ON g.table_name = c.table_name
            WHERE c.data_type = 'features'
            ORDER BY c.table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut layers = Vec::with_capacity(rows.len());
        for row in rows {
            let kind = match GeometryKind::from_name(&row.geometry_type_name) {
                Some(kind) => Some(kind),
                None => self.sample_kind(&row.table_name, &row.column_name).await?,
            };
            let Some(kind) = kind else {
                warn!(
                    layer = %row.table_name,
                    geometry_type = %row.geometry_type_name,
                    "Skipping layer with unsupported geometry type"
                );
                continue;
            };

            let crs = self.resolve_srs(row.srs_id).await?;
            layers.push(LayerInfo {
                name: row.table_name,
                geometry_column: row.column_name,
                kind,
                srs_id: row.srs_id,
                crs,
            });
        }

        if layers.is_empty() {
            return Err(GpkgError::NoLayers);
        }
        Ok(layers)
    }

    /// Look up one layer by exact table name.
    pub async fn layer(&self, name: &str) -> GpkgResult<LayerInfo> {
        self.layers()
            .await?
            .into_iter()
            .find(|l| l.name == name)
            .ok_or_else(|| GpkgError::LayerNotFound(name.to_string()))
    }

    /// Read every feature of a layer.
    pub async fn read_features(&self, info: &LayerInfo) -> GpkgResult<Vec<Feature>> {
        let primary_key = self.primary_key(&info.name).await?;

        let sql = format!("SELECT * FROM {}", quote_ident(&info.name));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let features = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                feature_from_row(row, i as i64 + 1, &info.geometry_column, primary_key.as_deref())
            })
            .collect::<GpkgResult<Vec<_>>>()?;

        debug!(layer = %info.name, features = features.len(), "Read layer");
        Ok(features)
    }

    /// Map an `srs_id` to an EPSG code.
    ///
    /// The GeoPackage "undefined" systems (0 and -1) are taken as the canonical CRS.
    async fn resolve_srs(&self, srs_id: i64) -> GpkgResult<Option<CrsCode>> {
        if srs_id == 0 || srs_id == -1 {
            return Ok(Some(CrsCode::CANONICAL));
        }

        let row = sqlx::query_as::<_, (String, i64)>(
            "SELECT organization, organization_coordsys_id FROM gpkg_spatial_ref_sys WHERE srs_id = ?",
        )
        .bind(srs_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some((organization, id)) => match CrsCode::from_organization(&organization, id) {
                Ok(code) => Some(code),
                Err(e) => {
                    debug!(srs_id, error = %e, "Non-EPSG spatial reference system");
                    None
                }
            },
            None => None,
        })
    }

    async fn primary_key(&self, table: &str) -> GpkgResult<Option<String>> {
        let pk = sqlx::query_scalar::<_, String>(
            "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk LIMIT 1",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pk)
    }

    /// Infer the kind of a generically typed layer from its first geometry.
    async fn sample_kind(&self, table: &str, column: &str) -> GpkgResult<Option<GeometryKind>> {
        let column = quote_ident(column);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} IS NOT NULL LIMIT 1",
            column,
            quote_ident(table),
            column
        );
        let blob = sqlx::query_scalar::<_, Vec<u8>>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match blob {
            Some(blob) => decode_geometry(&blob)?.as_ref().and_then(kind_of),
            None => None,
        })
    }
}

/// Geometry kind of a decoded geometry; `None` for collections and other types.
pub fn kind_of(geometry: &Geometry<f64>) -> Option<GeometryKind> {
    match geometry {
        Geometry::Point(_) => Some(GeometryKind::Point),
        Geometry::MultiPoint(_) => Some(GeometryKind::MultiPoint),
        Geometry::LineString(_) | Geometry::Line(_) => Some(GeometryKind::LineString),
        Geometry::MultiLineString(_) => Some(GeometryKind::MultiLineString),
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
            Some(GeometryKind::Polygon)
        }
        Geometry::MultiPolygon(_) => Some(GeometryKind::MultiPolygon),
        Geometry::GeometryCollection(_) => None,
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn feature_from_row(
    row: &SqliteRow,
    position: i64,
    geometry_column: &str,
    primary_key: Option<&str>,
) -> GpkgResult<Feature> {
    let mut id = position;
    let mut geometry = None;
    let mut properties = Map::new();

    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name();
        if name == geometry_column {
            let blob: Option<Vec<u8>> = row.try_get_unchecked(i)?;
            if let Some(blob) = blob {
                geometry = decode_geometry(&blob)?;
            }
        } else if Some(name) == primary_key {
            id = row.try_get_unchecked::<i64, _>(i)?;
        } else {
            properties.insert(name.to_string(), attribute_value(row, i)?);
        }
    }

    Ok(Feature {
        id,
        geometry,
        properties,
    })
}

/// Convert a dynamically typed SQLite value to JSON. BLOBs become null.
fn attribute_value(row: &SqliteRow, index: usize) -> GpkgResult<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Number(row.try_get_unchecked::<i64, _>(index)?.into()),
        "REAL" => Number::from_f64(row.try_get_unchecked::<f64, _>(index)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "TEXT" | "DATE" | "DATETIME" | "TIME" => {
            Value::String(row.try_get_unchecked::<String, _>(index)?)
        }
        _ => Value::Null,
    };
    Ok(value)
}

/// List the feature layers of a container file.
pub async fn list_layers(path: &Path) -> GpkgResult<Vec<LayerInfo>> {
    let gpkg = GeoPackage::open(path).await?;
    let result = gpkg.layers().await;
    gpkg.close().await;
    result
}

/// Read one layer's metadata and features from a container file.
pub async fn read_layer(path: &Path, layer: &str) -> GpkgResult<(LayerInfo, Vec<Feature>)> {
    let gpkg = GeoPackage::open(path).await?;
    let result = async {
        let info = gpkg.layer(layer).await?;
        let features = gpkg.read_features(&info).await?;
        Ok::<_, GpkgError>((info, features))
    }
    .await;
    gpkg.close().await;
    result
}
