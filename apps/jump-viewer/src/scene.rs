//! The JSON scene the viewer renders.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use jump_core::{
    CoreError, FeatureId, Layer, LayerManager, MapRequest, MapSource, Raster, Rgba, Selection,
    WmsLayer,
};
use jump_renderer::RenderingConfig;

#[derive(Debug, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default = "white")]
    pub background: Rgba,
    /// Server-backed layers, bottom first. They sit below every vector layer.
    #[serde(default)]
    pub wms_layers: Vec<WmsLayerEntry>,
    /// Vector layers, bottom first.
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub selection: Vec<SelectedFeature>,
}

fn white() -> Rgba {
    Rgba::WHITE
}

#[derive(Debug, Deserialize)]
pub struct WmsLayerEntry {
    pub layers: Vec<String>,
    #[serde(default = "default_srs")]
    pub srs: String,
    #[serde(default = "default_alpha")]
    pub alpha: u8,
    pub source: SourceKind,
}

fn default_srs() -> String {
    "EPSG:4326".to_string()
}

fn default_alpha() -> u8 {
    255
}

/// A stand-in for a map server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    Flat {
        color: Rgba,
        #[serde(default)]
        latency_ms: u64,
    },
    /// Alternating squares of `cell` model units.
    Checkerboard {
        cell: f64,
        even: Rgba,
        odd: Rgba,
        #[serde(default)]
        latency_ms: u64,
    },
}

#[derive(Debug, Deserialize)]
pub struct SelectedFeature {
    pub layer: String,
    pub feature: FeatureId,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing scene {}", path.display()))
    }

    /// Builds the layer stack and resolves the selection against it.
    pub fn into_model(self) -> Result<(LayerManager, Selection)> {
        let mut manager = LayerManager::new();
        for entry in self.wms_layers {
            let source: Arc<dyn MapSource> = Arc::new(SimulatedSource::new(entry.source));
            manager.add_wms_layer(
                WmsLayer::new(source, &entry.srs, entry.layers, "image/png").with_alpha(entry.alpha),
            );
        }
        for layer in self.layers {
            for feature in layer.features.iter() {
                feature
                    .geometry
                    .validate()
                    .with_context(|| format!("feature {} of layer '{}'", feature.id, layer.name))?;
            }
            manager.add_layer(layer);
        }

        let mut selection = Selection::new();
        for selected in self.selection {
            let layer = manager
                .iter()
                .find(|l| l.name() == selected.layer)
                .and_then(|l| manager.layer(l.id()))
                .ok_or_else(|| anyhow!("selection names unknown layer '{}'", selected.layer))?;
            let feature = layer.features.get(selected.feature).ok_or_else(|| {
                anyhow!("layer '{}' has no feature {}", selected.layer, selected.feature)
            })?;
            selection.select(layer.id, feature.clone());
        }
        Ok((manager, selection))
    }
}

pub struct SimulatedSource {
    kind: SourceKind,
}

impl SimulatedSource {
    pub fn new(kind: SourceKind) -> Self {
        Self { kind }
    }
}

impl MapSource for SimulatedSource {
    fn name(&self) -> &str {
        match self.kind {
            SourceKind::Flat { .. } => "flat",
            SourceKind::Checkerboard { .. } => "checkerboard",
        }
    }

    fn fetch(&self, request: &MapRequest) -> Result<Raster, CoreError> {
        let (width, height) = (request.image_width, request.image_height);
        match &self.kind {
            SourceKind::Flat { color, latency_ms } => {
                thread::sleep(Duration::from_millis(*latency_ms));
                Ok(Raster::filled(width, height, *color))
            }
            SourceKind::Checkerboard {
                cell,
                even,
                odd,
                latency_ms,
            } => {
                if *cell <= 0.0 {
                    return Err(CoreError::Fetch {
                        source_name: self.name().to_string(),
                        message: format!("cell size must be positive, got {cell}"),
                    });
                }
                thread::sleep(Duration::from_millis(*latency_ms));
                let bbox = request.bbox;
                let mut raster = Raster::new(width, height);
                for py in 0..height {
                    // Image rows run top to bottom, model y bottom to top.
                    let y = bbox.max.y - (py as f64 + 0.5) * bbox.height() / height as f64;
                    for px in 0..width {
                        let x = bbox.min.x + (px as f64 + 0.5) * bbox.width() / width as f64;
                        let parity = ((x / cell).floor() + (y / cell).floor()) as i64;
                        let color = if parity.rem_euclid(2) == 0 { *even } else { *odd };
                        raster.set(px as i64, py as i64, color);
                    }
                }
                Ok(raster)
            }
        }
    }
}
