//! Configuration for the vector layer engine.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vector_common::{VectorError, VectorResult};

/// Configuration for discovery, merging and serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory scanned for container files (not recursive).
    pub data_dir: PathBuf,

    /// Container file extensions, without the dot, matched case-insensitively.
    pub extensions: Vec<String>,

    /// Which files have their sub-layers merged into one logical layer.
    pub merge: MergeConfig,

    /// Douglas-Peucker tolerance in degrees applied when a request names none.
    pub default_simplify_tolerance: Option<f64>,

    /// Simplified GeoJSON variants kept per loaded layer. The least recently
    /// used variant is dropped beyond this.
    pub max_simplify_variants: usize,
}

/// Merge policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// File names (with extension) whose layers are always merged.
    pub files: Vec<String>,

    /// Merge files whose layers are numbered parts of one base name
    /// (`areas_1`, `areas_2` or `areas_part1`, `areas_part2`).
    pub by_convention: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/vector"),
            extensions: vec!["gpkg".to_string()],
            merge: MergeConfig::default(),
            default_simplify_tolerance: None,
            max_simplify_variants: 50,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            by_convention: true,
        }
    }
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> VectorResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VectorError::Config(format!("cannot read config file: {}", e)))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> VectorResult<Self> {
        serde_yaml::from_str(content).map_err(|e| VectorError::Config(e.to_string()))
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Override fields from variables returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("VECTOR_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("VECTOR_EXTENSIONS") {
            self.extensions = split_list(&val);
        }

        if let Some(val) = lookup("VECTOR_MERGE_FILES") {
            self.merge.files = split_list(&val);
        }

        if let Some(val) = lookup("VECTOR_MERGE_BY_CONVENTION") {
            self.merge.by_convention = val.to_lowercase() == "true" || val == "1";
        }

        if let Some(val) = lookup("VECTOR_SIMPLIFY_TOLERANCE") {
            if let Ok(tolerance) = val.parse() {
                self.default_simplify_tolerance = Some(tolerance);
            }
        }

        if let Some(val) = lookup("VECTOR_MAX_SIMPLIFY_VARIANTS") {
            if let Ok(max) = val.parse() {
                self.max_simplify_variants = max;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.extensions.is_empty() {
            return Err("extensions must not be empty".to_string());
        }

        if let Some(tolerance) = self.default_simplify_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err("default_simplify_tolerance must be a non-negative number".to_string());
            }
        }

        if self.max_simplify_variants == 0 {
            return Err("max_simplify_variants must be at least 1".to_string());
        }

        Ok(())
    }

    /// True when `file_name` carries one of the configured extensions.
    pub fn matches_extension(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }

    pub(crate) fn merge_files(&self) -> HashSet<String> {
        self.merge.files.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data/vector"));
        assert_eq!(config.extensions, vec!["gpkg"]);
        assert!(config.merge.by_convention);
        assert_eq!(config.max_simplify_variants, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config = EngineConfig::from_yaml_str(
            "data_dir: /srv/vector\nmerge:\n  files: [cables.gpkg]\n",
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/vector"));
        assert_eq!(config.merge.files, vec!["cables.gpkg"]);
        assert!(config.merge.by_convention);
        assert_eq!(config.extensions, vec!["gpkg"]);
    }

    #[test]
    fn test_yaml_invalid() {
        let err = EngineConfig::from_yaml_str("extensions: 12: 3").unwrap_err();
        assert!(matches!(err, VectorError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VECTOR_DATA_DIR", "/data"),
            ("VECTOR_EXTENSIONS", "gpkg, GPKG2 ,"),
            ("VECTOR_MERGE_FILES", "a.gpkg,b.gpkg"),
            ("VECTOR_MERGE_BY_CONVENTION", "false"),
            ("VECTOR_SIMPLIFY_TOLERANCE", "0.001"),
            ("VECTOR_MAX_SIMPLIFY_VARIANTS", "8"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.extensions, vec!["gpkg", "GPKG2"]);
        assert_eq!(config.merge.files, vec!["a.gpkg", "b.gpkg"]);
        assert!(!config.merge.by_convention);
        assert_eq!(config.default_simplify_tolerance, Some(0.001));
        assert_eq!(config.max_simplify_variants, 8);
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = EngineConfig {
            extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.extensions = vec!["gpkg".to_string()];
        config.default_simplify_tolerance = Some(-1.0);
        assert!(config.validate().is_err());

        config.default_simplify_tolerance = None;
        config.max_simplify_variants = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_matches_extension() {
        let config = EngineConfig::default();
        assert!(config.matches_extension("habitats.gpkg"));
        assert!(config.matches_extension("HABITATS.GPKG"));
        assert!(!config.matches_extension("habitats.gpkg.bak"));
        assert!(!config.matches_extension(".gpkg"));
        assert!(!config.matches_extension("gpkg"));
    }
}
