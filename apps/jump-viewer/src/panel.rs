use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use jump_core::{LayerManager, Layerable, Selection};
use jump_renderer::{LayerViewPanel, Viewport};

/// Shared view state of the headless viewer.
pub struct AppPanel {
    pub layers: Mutex<LayerManager>,
    pub selection: Mutex<Selection>,
    pub viewport: Mutex<Viewport>,
    repaints: AtomicUsize,
}

impl AppPanel {
    pub fn new(layers: LayerManager, selection: Selection, width: u32, height: u32) -> Self {
        let mut viewport = Viewport::new(width, height);
        if let Some(extent) = layers.envelope() {
            viewport.zoom_to_envelope(&extent);
        }
        Self {
            layers: Mutex::new(layers),
            selection: Mutex::new(selection),
            viewport: Mutex::new(viewport),
            repaints: AtomicUsize::new(0),
        }
    }

    pub fn repaint_count(&self) -> usize {
        self.repaints.load(Ordering::Relaxed)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LayerViewPanel for AppPanel {
    fn layerables(&self) -> Vec<Layerable> {
        lock(&self.layers).layerables()
    }

    fn viewport(&self) -> Viewport {
        *lock(&self.viewport)
    }

    fn selection(&self) -> Selection {
        lock(&self.selection).clone()
    }

    fn repaint(&self) {
        let count = self.repaints.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("Repaint #{count}");
    }
}
