use std::sync::Arc;

use crate::content::ContentId;
use crate::error::CoreError;
use crate::geometry::Envelope;
use crate::layer::{Layer, LayerId};
use crate::wms::WmsLayer;

/// Anything that occupies a slot in the layer stack.
#[derive(Debug, Clone)]
pub enum Layerable {
    Layer(Arc<Layer>),
    Wms(Arc<WmsLayer>),
}

impl Layerable {
    pub fn id(&self) -> LayerId {
        match self {
            Layerable::Layer(l) => l.id,
            Layerable::Wms(w) => w.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Layerable::Layer(l) => &l.name,
            Layerable::Wms(w) => &w.name,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Layerable::Layer(l) => l.visible,
            Layerable::Wms(w) => w.visible,
        }
    }

    pub fn content_id(&self) -> ContentId {
        match self {
            Layerable::Layer(l) => ContentId::Layer(l.id),
            Layerable::Wms(w) => ContentId::Wms(w.id),
        }
    }
}

/// The ordered layer stack. Index 0 is the topmost layer.
///
/// Entries are shared snapshots: edits replace the entry with a modified
/// copy, so renderers that already hold an `Arc` keep drawing a consistent
/// version.
#[derive(Debug, Clone, Default)]
pub struct LayerManager {
    layerables: Vec<Layerable>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Stack management ─────────────────────────────────────────────

    /// Adds a layer on top of the stack.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        log::debug!("Adding layer '{}' ({id})", layer.name);
        self.layerables.insert(0, Layerable::Layer(Arc::new(layer)));
        id
    }

    /// Adds a server-backed layer on top of the stack.
    pub fn add_wms_layer(&mut self, layer: WmsLayer) -> LayerId {
        let id = layer.id;
        log::debug!("Adding WMS layer '{}' ({id})", layer.name);
        self.layerables.insert(0, Layerable::Wms(Arc::new(layer)));
        id
    }

    pub fn remove(&mut self, id: LayerId) -> Result<Layerable, CoreError> {
        let index = self.index_of(id)?;
        Ok(self.layerables.remove(index))
    }

    /// Moves a layer to `index` (0 = top), clamped to the stack size.
    pub fn move_to(&mut self, id: LayerId, index: usize) -> Result<(), CoreError> {
        let from = self.index_of(id)?;
        let entry = self.layerables.remove(from);
        let to = index.min(self.layerables.len());
        self.layerables.insert(to, entry);
        Ok(())
    }

    fn index_of(&self, id: LayerId) -> Result<usize, CoreError> {
        self.layerables
            .iter()
            .position(|l| l.id() == id)
            .ok_or(CoreError::UnknownLayer(id))
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn find(&self, id: LayerId) -> Option<&Layerable> {
        self.layerables.iter().find(|l| l.id() == id)
    }

    pub fn layer(&self, id: LayerId) -> Option<Arc<Layer>> {
        match self.find(id)? {
            Layerable::Layer(l) => Some(Arc::clone(l)),
            Layerable::Wms(_) => None,
        }
    }

    pub fn wms_layer(&self, id: LayerId) -> Option<Arc<WmsLayer>> {
        match self.find(id)? {
            Layerable::Wms(w) => Some(Arc::clone(w)),
            Layerable::Layer(_) => None,
        }
    }

    /// Top of the stack first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layerable> {
        self.layerables.iter()
    }

    /// Bottom of the stack first, i.e. drawing order.
    pub fn reverse_iter(&self) -> impl Iterator<Item = &Layerable> {
        self.layerables.iter().rev()
    }

    pub fn layerables(&self) -> Vec<Layerable> {
        self.layerables.clone()
    }

    pub fn len(&self) -> usize {
        self.layerables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layerables.is_empty()
    }

    /// Union of the extents of all vector layers.
    pub fn envelope(&self) -> Option<Envelope> {
        self.layerables
            .iter()
            .filter_map(|l| match l {
                Layerable::Layer(layer) => layer.envelope(),
                Layerable::Wms(_) => None,
            })
            .reduce(|a, b| a.union(&b))
    }

    // ── Edits ────────────────────────────────────────────────────────

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), CoreError> {
        let index = self.index_of(id)?;
        match &mut self.layerables[index] {
            Layerable::Layer(l) => Arc::make_mut(l).visible = visible,
            Layerable::Wms(w) => Arc::make_mut(w).visible = visible,
        }
        Ok(())
    }

    /// Applies `edit` to a copy of the layer and swaps the copy in.
    pub fn update_layer<F>(&mut self, id: LayerId, edit: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Layer),
    {
        let index = self.index_of(id)?;
        match &mut self.layerables[index] {
            Layerable::Layer(l) => {
                edit(Arc::make_mut(l));
                Ok(())
            }
            Layerable::Wms(_) => Err(CoreError::UnknownLayer(id)),
        }
    }
}
