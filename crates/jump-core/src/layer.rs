use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feature::{Feature, FeatureCollection};
use crate::geometry::Envelope;
use crate::raster::Rgba;

/// Unique layer identifier.
pub type LayerId = Uuid;

/// Fill pattern for polygon interiors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPattern {
    #[default]
    Solid,
    Hatched,
    Outline,
}

/// How a layer's features are painted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerStyle {
    pub fill: Rgba,
    pub line: Rgba,
    pub line_width: u32,
    pub fill_pattern: FillPattern,
    pub opacity: f32,
    pub show_vertices: bool,
    pub vertex_size: u32,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            fill: Rgba::default(),
            line: Rgba::BLACK,
            line_width: 1,
            fill_pattern: FillPattern::Solid,
            opacity: 0.7,
            show_vertices: false,
            vertex_size: 4,
        }
    }
}

/// A vector data layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    #[serde(default = "Uuid::new_v4")]
    pub id: LayerId,
    pub name: String,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub style: LayerStyle,
    #[serde(default)]
    pub features: FeatureCollection,
}

fn visible_by_default() -> bool {
    true
}

impl Layer {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            visible: true,
            style: LayerStyle::default(),
            features: FeatureCollection::default(),
        }
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_fill(mut self, r: u8, g: u8, b: u8) -> Self {
        self.style.fill = Rgba::rgb(r, g, b);
        self
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = FeatureCollection::new(features);
        self
    }

    pub fn envelope(&self) -> Option<Envelope> {
        self.features.envelope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Point};

    #[test]
    fn test_layer_defaults() {
        let layer = Layer::new("roads");
        assert!(layer.visible);
        assert_eq!(layer.style.fill_pattern, FillPattern::Solid);
        assert!(layer.envelope().is_none());
    }

    #[test]
    fn test_layer_from_minimal_json() {
        let json = r#"{
            "name": "wells",
            "style": { "fill": { "r": 10, "g": 20, "b": 30 }, "fill_pattern": "hatched" },
            "features": [ { "id": 1, "geometry": { "type": "Point", "coordinates": { "x": 3.0, "y": 4.0 } } } ]
        }"#;
        let layer: Layer = serde_json::from_str(json).unwrap();
        assert!(layer.visible);
        assert_eq!(layer.style.fill, Rgba::rgb(10, 20, 30));
        assert_eq!(layer.style.fill_pattern, FillPattern::Hatched);
        assert_eq!(layer.style.line_width, 1);
        assert_eq!(
            layer.features.get(1).map(|f| &f.geometry),
            Some(&Geometry::Point(Point::new(3.0, 4.0)))
        );
    }
}
