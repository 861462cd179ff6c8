use std::sync::Arc;

use jump_core::{ContentId, Raster};

use crate::error::RenderError;

/// A unit of drawing work, run once on a render worker thread.
pub type RenderJob = Box<dyn FnOnce() -> Result<(), RenderError> + Send + 'static>;

/// Draws one piece of content into a private cached image.
///
/// Call [`Renderer::create_runnable`] first. `None` means there is nothing to
/// draw and the cached image (if any) is final. Otherwise run the job on a
/// worker; [`Renderer::copy_to`] may be called at any time to get the
/// partially drawn image, and drawing is done when
/// [`Renderer::is_rendering`] returns false.
pub trait Renderer: Send + Sync {
    fn content_id(&self) -> &ContentId;

    fn create_runnable(&self) -> Option<RenderJob>;

    fn is_rendering(&self) -> bool;

    /// Asks the running job to stop at its next checkpoint. Once this returns
    /// the cached image is no longer modified by that job.
    fn cancel(&self);

    fn copy_to(&self, target: &mut Raster);

    fn clear_image_cache(&self);
}

/// Builds renderers for fixed overlays.
pub trait RendererFactory: Send + Sync {
    fn create(&self) -> Arc<dyn Renderer>;
}

impl<F> RendererFactory for F
where
    F: Fn() -> Arc<dyn Renderer> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Renderer> {
        self()
    }
}
