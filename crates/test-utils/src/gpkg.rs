//! Minimal GeoPackage writer for fixtures.
//!
//! Creates just enough of the GeoPackage schema (`gpkg_spatial_ref_sys`,
//! `gpkg_contents`, `gpkg_geometry_columns`) for a reader to list and read
//! feature layers.

use std::path::Path;

use geo_types::Geometry;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};

use crate::encode::gpkg_blob;

const SCHEMA_SQL: &str = r#"
CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER
);
CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name)
);
INSERT INTO gpkg_spatial_ref_sys VALUES ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', NULL);
INSERT INTO gpkg_spatial_ref_sys VALUES ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', NULL);
INSERT INTO gpkg_spatial_ref_sys VALUES ('WGS 84 geodetic', 4326, 'EPSG', 4326, 'undefined', NULL)
"#;

/// One feature layer to be written.
#[derive(Debug, Clone)]
pub struct FixtureLayer {
    pub name: String,
    /// `geometry_type_name` recorded in `gpkg_geometry_columns`
    pub geometry_type: String,
    pub srs_id: i32,
    /// Organization and code for `srs_id`; EPSG by default
    pub organization: String,
    pub features: Vec<(Option<Geometry<f64>>, Value)>,
}

impl FixtureLayer {
    pub fn new(name: &str, geometry_type: &str, srs_id: i32) -> Self {
        Self {
            name: name.to_string(),
            geometry_type: geometry_type.to_string(),
            srs_id,
            organization: "EPSG".to_string(),
            features: Vec::new(),
        }
    }

    /// Register the SRS under a non-EPSG organization.
    pub fn organization(mut self, organization: &str) -> Self {
        self.organization = organization.to_string();
        self
    }

    /// Add a feature; `properties` must be a JSON object.
    pub fn feature(mut self, geometry: impl Into<Geometry<f64>>, properties: Value) -> Self {
        self.features.push((Some(geometry.into()), properties));
        self
    }

    pub fn null_feature(mut self, properties: Value) -> Self {
        self.features.push((None, properties));
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Attribute columns and their SQLite types, in order of first appearance.
    fn columns(&self) -> Vec<(String, &'static str)> {
        let mut columns: Vec<(String, &'static str)> = Vec::new();
        for (_, properties) in &self.features {
            let Some(object) = properties.as_object() else {
                continue;
            };
            for (key, value) in object {
                if columns.iter().any(|(name, _)| name == key) {
                    continue;
                }
                let sql_type = match value {
                    Value::Number(n) if n.is_i64() => "INTEGER",
                    Value::Number(_) => "REAL",
                    Value::Bool(_) => "BOOLEAN",
                    _ => "TEXT",
                };
                columns.push((key.clone(), sql_type));
            }
        }
        columns
    }
}

/// Builder for a GeoPackage file with any number of feature layers.
#[derive(Debug, Clone, Default)]
pub struct GpkgFixture {
    layers: Vec<FixtureLayer>,
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl GpkgFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, layer: FixtureLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Write the GeoPackage, replacing any existing file at `path`.
    pub async fn write(&self, path: &Path) -> Result<(), sqlx::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let mut conn: SqliteConnection = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .connect()
            .await?;

        sqlx::query("PRAGMA application_id = 1196444487")
            .execute(&mut conn)
            .await?;
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(&mut conn).await?;
            }
        }

        for layer in &self.layers {
            write_layer(&mut conn, layer).await?;
        }

        conn.close().await
    }
}

async fn write_layer(conn: &mut SqliteConnection, layer: &FixtureLayer) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO gpkg_spatial_ref_sys VALUES (?, ?, ?, ?, 'undefined', NULL)",
    )
    .bind(format!("{}:{}", layer.organization, layer.srs_id))
    .bind(layer.srs_id)
    .bind(layer.organization.as_str())
    .bind(layer.srs_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id) VALUES (?, 'features', ?, ?)")
        .bind(layer.name.as_str())
        .bind(layer.name.as_str())
        .bind(layer.srs_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("INSERT INTO gpkg_geometry_columns VALUES (?, 'geom', ?, ?, 0, 0)")
        .bind(layer.name.as_str())
        .bind(layer.geometry_type.as_str())
        .bind(layer.srs_id)
        .execute(&mut *conn)
        .await?;

    let columns = layer.columns();
    let mut ddl = format!(
        "CREATE TABLE {} (fid INTEGER PRIMARY KEY AUTOINCREMENT, geom BLOB",
        quote(&layer.name)
    );
    for (name, sql_type) in &columns {
        ddl.push_str(&format!(", {} {}", quote(name), sql_type));
    }
    ddl.push(')');
    sqlx::query(&ddl).execute(&mut *conn).await?;

    let mut insert = format!("INSERT INTO {} (geom", quote(&layer.name));
    for (name, _) in &columns {
        insert.push_str(&format!(", {}", quote(name)));
    }
    insert.push_str(") VALUES (?");
    insert.push_str(&", ?".repeat(columns.len()));
    insert.push(')');

    for (geometry, properties) in &layer.features {
        let blob = geometry.as_ref().map(|g| gpkg_blob(g, layer.srs_id));
        let mut query = sqlx::query(&insert).bind(blob);
        for (name, _) in &columns {
            query = match properties.get(name) {
                Some(Value::Number(n)) if n.is_i64() => query.bind(n.as_i64()),
                Some(Value::Number(n)) => query.bind(n.as_f64()),
                Some(Value::Bool(b)) => query.bind(*b),
                Some(Value::String(s)) => query.bind(s.clone()),
                Some(Value::Null) | None => query.bind(Option::<String>::None),
                Some(other) => query.bind(other.to_string()),
            };
        }
        query.execute(&mut *conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_in_first_appearance_order() {
        let layer = FixtureLayer::new("t", "POINT", 4326)
            .null_feature(json!({"name": "a", "depth": 12}))
            .null_feature(json!({"name": "b", "area": 1.5}));

        let columns = layer.columns();
        let names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"name") && names.contains(&"depth") && names.contains(&"area"));
        assert_eq!(columns.iter().find(|(n, _)| n == "depth").map(|(_, t)| *t), Some("INTEGER"));
        assert_eq!(columns.iter().find(|(n, _)| n == "area").map(|(_, t)| *t), Some("REAL"));
    }
}
