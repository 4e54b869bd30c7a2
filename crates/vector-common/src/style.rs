//! Default Leaflet path styles per geometry kind.

use serde::{Deserialize, Serialize};

use crate::GeometryKind;

/// Leaflet path options sent alongside vector layers.
///
/// Field names follow Leaflet's camelCase option names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl LayerStyle {
    /// Default style for a geometry kind. Single and multi variants share a style.
    pub fn default_for(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Polygon | GeometryKind::MultiPolygon => Self {
                color: Some("#008B8B".to_string()),
                fill_color: Some("#20B2AA".to_string()),
                weight: Some(2),
                radius: None,
                fill_opacity: Some(0.4),
                opacity: Some(0.8),
            },
            GeometryKind::LineString | GeometryKind::MultiLineString => Self {
                color: Some("#40E0D0".to_string()),
                fill_color: None,
                weight: Some(3),
                radius: None,
                fill_opacity: None,
                opacity: Some(0.8),
            },
            GeometryKind::Point | GeometryKind::MultiPoint => Self {
                color: Some("#48D1CC".to_string()),
                fill_color: Some("#20B2AA".to_string()),
                weight: None,
                radius: Some(6),
                fill_opacity: Some(0.8),
                opacity: Some(1.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_color() {
        for kind in [
            GeometryKind::Point,
            GeometryKind::MultiPoint,
            GeometryKind::LineString,
            GeometryKind::MultiLineString,
            GeometryKind::Polygon,
            GeometryKind::MultiPolygon,
        ] {
            let style = LayerStyle::default_for(kind);
            assert!(style.color.is_some() || style.fill_color.is_some());
        }
    }

    #[test]
    fn test_camel_case_serialization() {
        let json = serde_json::to_value(LayerStyle::default_for(GeometryKind::Polygon)).unwrap();
        assert_eq!(json["fillColor"], "#20B2AA");
        assert_eq!(json["fillOpacity"], 0.4);
        assert!(json.get("radius").is_none());
    }
}
