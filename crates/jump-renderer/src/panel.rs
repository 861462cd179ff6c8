use jump_core::{LayerId, Layerable, Selection};

use crate::viewport::Viewport;

/// The view the rendering manager draws for.
///
/// Implementations are shared with worker threads and the repaint timer, so
/// every method must be cheap and must not call back into the manager.
pub trait LayerViewPanel: Send + Sync {
    /// Current layer stack, topmost first.
    fn layerables(&self) -> Vec<Layerable>;

    fn viewport(&self) -> Viewport;

    fn selection(&self) -> Selection;

    /// Requests that the panel repaint itself from the manager's images.
    fn repaint(&self);

    fn find_layerable(&self, id: LayerId) -> Option<Layerable> {
        self.layerables().into_iter().find(|l| l.id() == id)
    }
}
