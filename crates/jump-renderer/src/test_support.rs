//! Panels, map sources and renderers shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use jump_core::{
    ContentId, CoreError, Feature, Layer, LayerId, LayerManager, Layerable, MapRequest, MapSource,
    Raster, Rgba, Selection, WmsLayer,
};

use crate::error::RenderError;
use crate::panel::LayerViewPanel;
use crate::renderer::{RenderJob, Renderer};
use crate::viewport::Viewport;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Polls `condition` for up to five seconds.
pub fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

pub struct TestPanel {
    layers: Mutex<LayerManager>,
    selection: Mutex<Selection>,
    viewport: Mutex<Viewport>,
    repaints: AtomicUsize,
}

impl TestPanel {
    /// A `width` x `height` view centred on the model origin at zoom 1.
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            layers: Mutex::new(LayerManager::new()),
            selection: Mutex::new(Selection::new()),
            viewport: Mutex::new(Viewport::new(width, height)),
            repaints: AtomicUsize::new(0),
        })
    }

    pub fn add_layer(&self, layer: Layer) -> LayerId {
        lock(&self.layers).add_layer(layer)
    }

    pub fn add_wms_layer(&self, layer: WmsLayer) -> LayerId {
        lock(&self.layers).add_wms_layer(layer)
    }

    pub fn set_visible(&self, id: LayerId, visible: bool) {
        lock(&self.layers)
            .set_visible(id, visible)
            .expect("layer is in the panel");
    }

    pub fn select(&self, layer: LayerId, feature: Feature) {
        lock(&self.selection).select(layer, feature);
    }

    pub fn clear_selection(&self) {
        lock(&self.selection).clear();
    }

    pub fn repaint_count(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }
}

impl LayerViewPanel for TestPanel {
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
        self.repaints.fetch_add(1, Ordering::SeqCst);
    }
}

/// Map source that answers every request with one colour.
pub struct FlatSource {
    color: Option<Rgba>,
    requests: Mutex<Vec<MapRequest>>,
    gate: Option<Receiver<()>>,
}

impl FlatSource {
    pub fn new(color: Rgba) -> Self {
        Self {
            color: Some(color),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            color: None,
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Every fetch blocks until a message arrives on `gate`.
    pub fn gated(color: Rgba, gate: Receiver<()>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(color)
        }
    }

    pub fn requests(&self) -> Vec<MapRequest> {
        lock(&self.requests).clone()
    }
}

impl MapSource for FlatSource {
    fn name(&self) -> &str {
        "flat"
    }

    fn fetch(&self, request: &MapRequest) -> Result<Raster, CoreError> {
        lock(&self.requests).push(request.clone());
        if let Some(gate) = &self.gate {
            let _ = gate.recv_timeout(Duration::from_secs(10));
        }
        match self.color {
            Some(color) => Ok(Raster::filled(request.image_width, request.image_height, color)),
            None => Err(CoreError::Fetch {
                source_name: self.name().to_string(),
                message: "server unavailable".to_string(),
            }),
        }
    }
}

/// Renderer for overlay tests. Its jobs optionally wait on a gate and
/// `copy_to` appends its content id to a shared log.
pub struct RecordingRenderer {
    content_id: ContentId,
    gate: Option<Receiver<()>>,
    rendering: Arc<AtomicBool>,
    copies: Arc<Mutex<Vec<ContentId>>>,
}

impl RecordingRenderer {
    pub fn new(content_id: ContentId, copies: Arc<Mutex<Vec<ContentId>>>) -> Self {
        Self {
            content_id,
            gate: None,
            rendering: Arc::new(AtomicBool::new(false)),
            copies,
        }
    }

    pub fn gated(mut self, gate: Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Renderer for RecordingRenderer {
    fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    fn create_runnable(&self) -> Option<RenderJob> {
        self.rendering.store(true, Ordering::SeqCst);
        let rendering = Arc::clone(&self.rendering);
        let gate = self.gate.clone();
        Some(Box::new(move || -> Result<(), RenderError> {
            if let Some(gate) = gate {
                let _ = gate.recv_timeout(Duration::from_secs(10));
            }
            rendering.store(false, Ordering::SeqCst);
            Ok(())
        }))
    }

    fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    fn cancel(&self) {}

    fn copy_to(&self, _target: &mut Raster) {
        lock(&self.copies).push(self.content_id.clone());
    }

    fn clear_image_cache(&self) {}
}
