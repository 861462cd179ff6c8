//! # JUMP Renderer
//!
//! Progressive, multi-threaded drawing of a layer view.
//!
//! The [`RenderingManager`] keeps one [`Renderer`] per piece of content (data
//! layers, server-backed layers, selection overlays). Each renderer draws into
//! its own cached image on a worker from one of two bounded [`ThreadQueue`]s,
//! and a [`RepaintTimer`] asks the panel to repaint periodically until every
//! renderer has finished. The panel composites the images with
//! [`RenderingManager::copy_to`].

pub mod config;
pub mod error;
pub mod image_cache;
pub mod layer_renderer;
pub mod manager;
pub mod paint;
pub mod panel;
pub mod renderer;
pub mod repaint_timer;
pub mod selection_renderer;
pub mod thread_queue;
pub mod viewport;
pub mod wms_renderer;

#[cfg(test)]
mod test_support;

pub use config::RenderingConfig;
pub use error::RenderError;
pub use image_cache::{DrawSession, ImageCache};
pub use layer_renderer::LayerRenderer;
pub use manager::RenderingManager;
pub use panel::LayerViewPanel;
pub use renderer::{RenderJob, Renderer, RendererFactory};
pub use repaint_timer::{RepaintTarget, RepaintTimer};
pub use selection_renderer::{
    SelectionRenderer, SelectionStyle, FEATURE_SELECTION, LINE_STRING_SELECTION, PART_SELECTION,
    SELECTION_BACKGROUND,
};
pub use thread_queue::ThreadQueue;
pub use viewport::Viewport;
pub use wms_renderer::WmsLayerRenderer;
