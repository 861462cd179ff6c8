//! The cached image behind every concrete renderer, and the state machine
//! that decides who may write to it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jump_core::Raster;

use crate::error::RenderError;

#[derive(Debug, Default)]
pub struct ImageCache {
    image: RwLock<Option<Raster>>,
    rendering: AtomicBool,
    cancelled: AtomicBool,
    epoch: AtomicU64,
}

impl ImageCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts a new draw. Any older session on this cache becomes stale.
    pub fn begin(self: &Arc<Self>) -> DrawSession {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.cancelled.store(false, Ordering::Release);
        self.rendering.store(true, Ordering::Release);
        DrawSession {
            cache: Arc::clone(self),
            epoch,
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::Acquire)
    }

    /// Flags the current draw as cancelled and returns at once. The draw
    /// notices at its next write, which re-checks under the image lock.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    pub fn has_image(&self) -> bool {
        self.read().is_some()
    }

    /// Composites whatever has been drawn so far onto `target`.
    pub fn copy_to(&self, target: &mut Raster, opacity: f32) {
        if let Some(image) = self.read().as_ref() {
            target.draw_over(image, opacity);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Raster>> {
        self.image.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Raster>> {
        self.image.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write access to an [`ImageCache`] for one draw.
///
/// Every write re-checks that the session is still current under the image
/// lock, so a cancelled or superseded draw can never touch the image.
/// Dropping the session (finished, failed, panicked or never run) clears
/// the rendering flag unless a newer session has started.
#[derive(Debug)]
pub struct DrawSession {
    cache: Arc<ImageCache>,
    epoch: u64,
}

impl DrawSession {
    pub fn is_current(&self) -> bool {
        !self.cache.cancelled.load(Ordering::Acquire)
            && self.cache.epoch.load(Ordering::Acquire) == self.epoch
    }

    pub fn checkpoint(&self) -> Result<(), RenderError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(RenderError::Cancelled)
        }
    }

    /// Installs a blank image so readers see progress from the first paint.
    pub fn start_image(&self, width: u32, height: u32) -> Result<(), RenderError> {
        self.replace_image(Raster::new(width, height))
    }

    pub fn replace_image(&self, image: Raster) -> Result<(), RenderError> {
        let mut guard = self.cache.write();
        self.checkpoint()?;
        *guard = Some(image);
        Ok(())
    }

    /// Runs `paint` against the current image. A no-op if no image has been
    /// started.
    pub fn paint<F>(&self, paint: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut Raster),
    {
        let mut guard = self.cache.write();
        self.checkpoint()?;
        if let Some(image) = guard.as_mut() {
            paint(image);
        }
        Ok(())
    }
}

impl Drop for DrawSession {
    fn drop(&mut self) {
        if self.cache.epoch.load(Ordering::Acquire) == self.epoch {
            self.cache.rendering.store(false, Ordering::Release);
        }
    }
}
