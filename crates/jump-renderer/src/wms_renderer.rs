use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use jump_core::{ContentId, LayerId, Layerable, Raster, WmsLayer};

use crate::error::RenderError;
use crate::image_cache::ImageCache;
use crate::panel::LayerViewPanel;
use crate::renderer::{RenderJob, Renderer};

/// Fetches a server-rendered image for the current view.
pub struct WmsLayerRenderer {
    content_id: ContentId,
    layer_id: LayerId,
    panel: Arc<dyn LayerViewPanel>,
    cache: Arc<ImageCache>,
    visible: AtomicBool,
    alpha: AtomicU8,
}

impl WmsLayerRenderer {
    pub fn new(layer_id: LayerId, panel: Arc<dyn LayerViewPanel>) -> Self {
        Self {
            content_id: ContentId::Wms(layer_id),
            layer_id,
            panel,
            cache: ImageCache::new(),
            visible: AtomicBool::new(true),
            alpha: AtomicU8::new(255),
        }
    }

    fn current_layer(&self) -> Option<Arc<WmsLayer>> {
        match self.panel.find_layerable(self.layer_id)? {
            Layerable::Wms(layer) => Some(layer),
            Layerable::Layer(_) => None,
        }
    }
}

impl Renderer for WmsLayerRenderer {
    fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    fn create_runnable(&self) -> Option<RenderJob> {
        let layer = self.current_layer().filter(|l| l.visible);
        self.visible.store(layer.is_some(), Ordering::Release);
        let layer = layer?;
        self.alpha.store(layer.alpha, Ordering::Release);

        let viewport = self.panel.viewport();
        let request = layer.create_request(
            viewport.envelope_in_model_coordinates(),
            viewport.canvas_width,
            viewport.canvas_height,
        );
        let session = self.cache.begin();
        Some(Box::new(move || -> Result<(), RenderError> {
            session.checkpoint()?;
            let image = layer.fetch(&request).map_err(|source| RenderError::Fetch {
                layer: layer.name.clone(),
                source,
            })?;
            session.replace_image(image)?;
            log::debug!("Fetched map image for '{}'", layer.name);
            Ok(())
        }))
    }

    fn is_rendering(&self) -> bool {
        self.cache.is_rendering()
    }

    fn cancel(&self) {
        self.cache.cancel();
    }

    fn copy_to(&self, target: &mut Raster) {
        if self.visible.load(Ordering::Acquire) {
            let alpha = self.alpha.load(Ordering::Acquire);
            self.cache.copy_to(target, alpha as f32 / 255.0);
        }
    }

    fn clear_image_cache(&self) {
        self.cache.clear();
    }
}
