//! Server-backed map layers.
//!
//! A [`WmsLayer`] draws whatever image its [`MapSource`] returns for the
//! current view. The HTTP client that talks to a real map server lives
//! outside this crate; anything that can turn a [`MapRequest`] into a raster
//! can back a layer.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::CoreError;
use crate::geometry::Envelope;
use crate::layer::LayerId;
use crate::raster::Raster;

/// Parameters of a single GetMap-style image request.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub bbox: Envelope,
    pub srs: String,
    pub image_width: u32,
    pub image_height: u32,
    pub layers: Vec<String>,
    pub format: String,
    pub transparent: bool,
}

/// Produces map images. Called from rendering worker threads and may block.
pub trait MapSource: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    fn fetch(&self, request: &MapRequest) -> Result<Raster, CoreError>;
}

/// A layer whose image is produced by a map server.
#[derive(Clone)]
pub struct WmsLayer {
    pub id: LayerId,
    pub name: String,
    pub srs: String,
    pub layer_names: Vec<String>,
    pub format: String,
    /// 0 (invisible) ..= 255 (opaque).
    pub alpha: u8,
    pub visible: bool,
    pub source: Arc<dyn MapSource>,
}

impl WmsLayer {
    /// The layer is named after its first server layer, if any.
    pub fn new(source: Arc<dyn MapSource>, srs: &str, layer_names: Vec<String>, format: &str) -> Self {
        let name = layer_names
            .first()
            .cloned()
            .unwrap_or_else(|| source.name().to_string());
        Self {
            id: Uuid::new_v4(),
            name,
            srs: srs.to_string(),
            layer_names,
            format: format.to_string(),
            alpha: 255,
            visible: true,
            source,
        }
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn create_request(&self, bbox: Envelope, image_width: u32, image_height: u32) -> MapRequest {
        MapRequest {
            bbox,
            srs: self.srs.clone(),
            image_width,
            image_height,
            layers: self.layer_names.clone(),
            format: self.format.clone(),
            transparent: true,
        }
    }

    pub fn fetch(&self, request: &MapRequest) -> Result<Raster, CoreError> {
        self.source.fetch(request)
    }
}

impl fmt::Debug for WmsLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WmsLayer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("srs", &self.srs)
            .field("layer_names", &self.layer_names)
            .field("format", &self.format)
            .field("alpha", &self.alpha)
            .field("visible", &self.visible)
            .field("source", &self.source.name())
            .finish()
    }
}
