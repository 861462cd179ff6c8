//! The rendering manager: one renderer per content id, two worker queues and
//! a repaint timer that runs while anything is drawing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jump_core::{ContentId, Raster};

use crate::config::RenderingConfig;
use crate::error::RenderError;
use crate::layer_renderer::LayerRenderer;
use crate::panel::LayerViewPanel;
use crate::renderer::{RenderJob, Renderer, RendererFactory};
use crate::repaint_timer::{RepaintTarget, RepaintTimer};
use crate::selection_renderer::{
    SelectionRenderer, FEATURE_SELECTION, LINE_STRING_SELECTION, PART_SELECTION, SELECTION_BACKGROUND,
};
use crate::thread_queue::ThreadQueue;
use crate::wms_renderer::WmsLayerRenderer;

type Factories = Vec<(ContentId, Arc<dyn RendererFactory>)>;

struct RendererSlot {
    renderer: Arc<dyn Renderer>,
    /// Shared by every renderer that has held this slot. Bumped on each
    /// submission so queued work for an older submission is skipped.
    generation: Arc<AtomicU64>,
}

/// State the repaint timer shares with the manager.
struct Shared {
    panel: Arc<dyn LayerViewPanel>,
    renderers: Mutex<HashMap<ContentId, RendererSlot>>,
    painting_enabled: AtomicBool,
}

impl Shared {
    fn renderers(&self) -> MutexGuard<'_, HashMap<ContentId, RendererSlot>> {
        self.renderers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RepaintTarget for Shared {
    fn is_active(&self) -> bool {
        self.renderers().values().any(|slot| slot.renderer.is_rendering())
    }

    fn repaint(&self) {
        if self.painting_enabled.load(Ordering::Acquire) {
            self.panel.repaint();
        }
    }
}

pub struct RenderingManager {
    shared: Arc<Shared>,
    below: Mutex<Factories>,
    above: Mutex<Factories>,
    default_queue: ThreadQueue,
    server_queue: ThreadQueue,
    repaint_timer: RepaintTimer,
    disposed: AtomicBool,
}

impl RenderingManager {
    /// Creates a manager drawing for `panel`, with the selection overlays
    /// registered above all layers.
    pub fn new(panel: Arc<dyn LayerViewPanel>, config: &RenderingConfig) -> Self {
        let manager = Self {
            shared: Arc::new(Shared {
                panel: Arc::clone(&panel),
                renderers: Mutex::new(HashMap::new()),
                painting_enabled: AtomicBool::new(true),
            }),
            below: Mutex::new(Vec::new()),
            above: Mutex::new(Vec::new()),
            default_queue: ThreadQueue::new("render", config.default_queue_threads),
            server_queue: ThreadQueue::new("wms-render", config.server_queue_threads),
            repaint_timer: RepaintTimer::new(config.repaint_interval(), config.coalesce_repaints),
            disposed: AtomicBool::new(false),
        };

        let overlays: [(ContentId, fn(Arc<dyn LayerViewPanel>) -> SelectionRenderer); 4] = [
            (SELECTION_BACKGROUND, SelectionRenderer::background),
            (FEATURE_SELECTION, SelectionRenderer::highlight),
            (LINE_STRING_SELECTION, SelectionRenderer::line_strings),
            (PART_SELECTION, SelectionRenderer::parts),
        ];
        for (id, create) in overlays {
            let panel = Arc::clone(&panel);
            manager.put_above_layerables(id, move || -> Arc<dyn Renderer> {
                Arc::new(create(Arc::clone(&panel)))
            });
        }
        manager
    }

    pub fn panel(&self) -> &Arc<dyn LayerViewPanel> {
        &self.shared.panel
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Renders `id`, discarding its cached image first.
    pub fn render(&self, id: &ContentId) -> Result<(), RenderError> {
        self.render_with(id, true)
    }

    /// Renders `id`. A renderer that is still working is cancelled and
    /// replaced by a fresh one.
    ///
    /// # Panics
    ///
    /// If `id` is neither a layer in the panel's stack nor a registered
    /// overlay.
    pub fn render_with(&self, id: &ContentId, clear_image_cache: bool) -> Result<(), RenderError> {
        if self.is_disposed() {
            return Err(RenderError::Disposed);
        }
        let (renderer, generation) = self.acquire_renderer(id);
        if clear_image_cache {
            renderer.clear_image_cache();
        }

        if let Some(job) = renderer.create_runnable() {
            let ticket = generation.fetch_add(1, Ordering::AcqRel) + 1;
            let job_id = id.clone();
            let wrapped: RenderJob = Box::new(move || -> Result<(), RenderError> {
                if generation.load(Ordering::Acquire) != ticket {
                    log::debug!("Skipping superseded render of {job_id}");
                    return Ok(());
                }
                job()
            });
            let queue = if id.is_server_backed() {
                &self.server_queue
            } else {
                &self.default_queue
            };
            queue.add(wrapped)?;
        }

        let target: Arc<dyn RepaintTarget> = self.shared.clone();
        if self.repaint_timer.start(Arc::clone(&target)) {
            target.repaint();
        }
        Ok(())
    }

    /// Drops all queued work, then renders every content id, bottom to top.
    pub fn render_all(&self) -> Result<(), RenderError> {
        if self.is_disposed() {
            return Err(RenderError::Disposed);
        }
        self.default_queue.clear();
        self.server_queue.clear();
        for id in self.composition_order() {
            self.render(&id)?;
        }
        Ok(())
    }

    /// Content ids bottom to top: overlays below the layers, the layers
    /// themselves, then overlays above.
    pub fn composition_order(&self) -> Vec<ContentId> {
        let mut order: Vec<ContentId> = lock(&self.below).iter().map(|(id, _)| id.clone()).collect();
        order.extend(self.shared.panel.layerables().iter().rev().map(|l| l.content_id()));
        order.extend(lock(&self.above).iter().map(|(id, _)| id.clone()));
        order
    }

    /// Composites every renderer's current image onto `target`, bottom to
    /// top. Renderers still drawing contribute what they have so far.
    pub fn copy_to(&self, target: &mut Raster) {
        let order = self.composition_order();
        let renderers: Vec<Arc<dyn Renderer>> = {
            let slots = self.shared.renderers();
            order
                .iter()
                .filter_map(|id| slots.get(id).map(|slot| Arc::clone(&slot.renderer)))
                .collect()
        };
        for renderer in renderers {
            renderer.copy_to(target);
        }
    }

    fn acquire_renderer(&self, id: &ContentId) -> (Arc<dyn Renderer>, Arc<AtomicU64>) {
        let current = self
            .shared
            .renderers()
            .get(id)
            .map(|slot| (Arc::clone(&slot.renderer), Arc::clone(&slot.generation)));

        match current {
            Some((renderer, generation)) if !renderer.is_rendering() => (renderer, generation),
            Some((renderer, generation)) => {
                renderer.cancel();
                log::debug!("Replacing busy renderer for {id}");
                let replacement = self.create_renderer(id);
                self.install(id, &replacement, &generation);
                (replacement, generation)
            }
            None => {
                let renderer = self.create_renderer(id);
                let generation = Arc::new(AtomicU64::new(0));
                self.install(id, &renderer, &generation);
                (renderer, generation)
            }
        }
    }

    fn install(&self, id: &ContentId, renderer: &Arc<dyn Renderer>, generation: &Arc<AtomicU64>) {
        self.shared.renderers().insert(
            id.clone(),
            RendererSlot {
                renderer: Arc::clone(renderer),
                generation: Arc::clone(generation),
            },
        );
    }

    fn create_renderer(&self, id: &ContentId) -> Arc<dyn Renderer> {
        let panel = &self.shared.panel;
        match id {
            ContentId::Layer(layer_id) | ContentId::Wms(layer_id) => {
                assert!(
                    panel.find_layerable(*layer_id).is_some(),
                    "no layer {layer_id} in the layer stack"
                );
                if id.is_server_backed() {
                    Arc::new(WmsLayerRenderer::new(*layer_id, Arc::clone(panel)))
                } else {
                    Arc::new(LayerRenderer::new(*layer_id, Arc::clone(panel)))
                }
            }
            ContentId::Overlay(_) => {
                let factory = find_factory(&lock(&self.above), id)
                    .or_else(|| find_factory(&lock(&self.below), id));
                match factory {
                    Some(factory) => factory.create(),
                    None => panic!("no renderer factory registered for {id}"),
                }
            }
        }
    }

    // ── Overlay registration ─────────────────────────────────────────

    /// Registers an overlay drawn beneath every layer. Re-registering an id
    /// replaces its factory and keeps its position.
    pub fn put_below_layerables<F>(&self, id: ContentId, factory: F)
    where
        F: RendererFactory + 'static,
    {
        put_factory(&mut lock(&self.below), id, Arc::new(factory));
    }

    /// Registers an overlay drawn above every layer.
    pub fn put_above_layerables<F>(&self, id: ContentId, factory: F)
    where
        F: RendererFactory + 'static,
    {
        put_factory(&mut lock(&self.above), id, Arc::new(factory));
    }

    // ── State ────────────────────────────────────────────────────────

    pub fn get_renderer(&self, id: &ContentId) -> Option<Arc<dyn Renderer>> {
        self.shared
            .renderers()
            .get(id)
            .map(|slot| Arc::clone(&slot.renderer))
    }

    /// Ids that currently have a renderer, in no particular order.
    pub fn content_ids(&self) -> Vec<ContentId> {
        self.shared.renderers().keys().cloned().collect()
    }

    /// Whether any renderer is still drawing.
    pub fn is_rendering(&self) -> bool {
        self.shared.is_active()
    }

    pub fn set_painting_enabled(&self, enabled: bool) {
        self.shared.painting_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_painting_enabled(&self) -> bool {
        self.shared.painting_enabled.load(Ordering::Acquire)
    }

    pub fn default_queue(&self) -> &ThreadQueue {
        &self.default_queue
    }

    pub fn server_queue(&self) -> &ThreadQueue {
        &self.server_queue
    }

    pub fn is_repaint_timer_running(&self) -> bool {
        self.repaint_timer.is_running()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Stops the timer, cancels every renderer and waits for the workers.
    /// Later calls do nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.repaint_timer.stop();
        let renderers: Vec<Arc<dyn Renderer>> = self
            .shared
            .renderers()
            .values()
            .map(|slot| Arc::clone(&slot.renderer))
            .collect();
        for renderer in &renderers {
            renderer.cancel();
        }
        self.default_queue.dispose();
        self.server_queue.dispose();
        self.shared.renderers().clear();
        log::info!("Rendering manager disposed ({} renderers)", renderers.len());
    }
}

impl Drop for RenderingManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn lock(factories: &Mutex<Factories>) -> MutexGuard<'_, Factories> {
    factories.lock().unwrap_or_else(PoisonError::into_inner)
}

fn find_factory(factories: &Factories, id: &ContentId) -> Option<Arc<dyn RendererFactory>> {
    factories
        .iter()
        .find(|(existing, _)| existing == id)
        .map(|(_, factory)| Arc::clone(factory))
}

fn put_factory(factories: &mut Factories, id: ContentId, factory: Arc<dyn RendererFactory>) {
    match factories.iter_mut().find(|(existing, _)| *existing == id) {
        Some(entry) => entry.1 = factory,
        None => factories.push((id, factory)),
    }
}
