use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jump_core::{ContentId, Layer, LayerId, Layerable, Raster};

use crate::error::RenderError;
use crate::image_cache::{DrawSession, ImageCache};
use crate::paint;
use crate::panel::LayerViewPanel;
use crate::renderer::{RenderJob, Renderer};
use crate::viewport::Viewport;

/// Draws the features of one vector layer that fall inside the viewport.
pub struct LayerRenderer {
    content_id: ContentId,
    layer_id: LayerId,
    panel: Arc<dyn LayerViewPanel>,
    cache: Arc<ImageCache>,
    visible: AtomicBool,
}

impl LayerRenderer {
    pub fn new(layer_id: LayerId, panel: Arc<dyn LayerViewPanel>) -> Self {
        Self {
            content_id: ContentId::Layer(layer_id),
            layer_id,
            panel,
            cache: ImageCache::new(),
            visible: AtomicBool::new(true),
        }
    }

    fn current_layer(&self) -> Option<Arc<Layer>> {
        match self.panel.find_layerable(self.layer_id)? {
            Layerable::Layer(layer) => Some(layer),
            Layerable::Wms(_) => None,
        }
    }
}

impl Renderer for LayerRenderer {
    fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    fn create_runnable(&self) -> Option<RenderJob> {
        let layer = self.current_layer().filter(|l| l.visible);
        // An invisible layer keeps its cached image but stops showing it.
        self.visible.store(layer.is_some(), Ordering::Release);
        let layer = layer?;
        let viewport = self.panel.viewport();
        let session = self.cache.begin();
        Some(Box::new(move || draw_layer(&session, &layer, &viewport)))
    }

    fn is_rendering(&self) -> bool {
        self.cache.is_rendering()
    }

    fn cancel(&self) {
        self.cache.cancel();
    }

    fn copy_to(&self, target: &mut Raster) {
        if self.visible.load(Ordering::Acquire) {
            self.cache.copy_to(target, 1.0);
        }
    }

    fn clear_image_cache(&self) {
        self.cache.clear();
    }
}

fn draw_layer(session: &DrawSession, layer: &Layer, viewport: &Viewport) -> Result<(), RenderError> {
    session.start_image(viewport.canvas_width, viewport.canvas_height)?;
    let style = &layer.style;
    // Pad by the stroke width so outlines of features just off-screen still show.
    let pad = (style.line_width.max(style.vertex_size) as f64) / viewport.zoom;
    let envelope = viewport.envelope_in_model_coordinates().expand_by(pad);
    let features = layer.features.query(&envelope);
    for feature in &features {
        session.paint(|image| paint::paint_geometry(image, viewport, &feature.geometry, style))?;
    }
    // Vertex markers paint last.
    if style.show_vertices {
        let color = style.line.with_opacity(1.0);
        for feature in &features {
            session.paint(|image| {
                paint::paint_vertices(image, viewport, &feature.geometry, style.vertex_size, color)
            })?;
        }
    }
    log::debug!("Drew {} features of layer '{}'", features.len(), layer.name);
    Ok(())
}
