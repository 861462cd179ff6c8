use std::collections::BTreeMap;

use crate::feature::{Feature, FeatureId};
use crate::layer::LayerId;

/// Selected features, grouped by the layer they belong to.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    by_layer: BTreeMap<LayerId, Vec<Feature>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting an already-selected feature is a no-op.
    pub fn select(&mut self, layer: LayerId, feature: Feature) {
        let items = self.by_layer.entry(layer).or_default();
        if !items.iter().any(|f| f.id == feature.id) {
            items.push(feature);
        }
    }

    pub fn unselect(&mut self, layer: LayerId, feature: FeatureId) -> bool {
        let Some(items) = self.by_layer.get_mut(&layer) else {
            return false;
        };
        let before = items.len();
        items.retain(|f| f.id != feature);
        let removed = items.len() != before;
        if items.is_empty() {
            self.by_layer.remove(&layer);
        }
        removed
    }

    pub fn unselect_layer(&mut self, layer: LayerId) {
        self.by_layer.remove(&layer);
    }

    pub fn clear(&mut self) {
        self.by_layer.clear();
    }

    pub fn is_selected(&self, layer: LayerId, feature: FeatureId) -> bool {
        self.by_layer
            .get(&layer)
            .is_some_and(|items| items.iter().any(|f| f.id == feature))
    }

    /// Every selected feature with its layer.
    pub fn items(&self) -> impl Iterator<Item = (LayerId, &Feature)> {
        self.by_layer
            .iter()
            .flat_map(|(layer, items)| items.iter().map(move |f| (*layer, f)))
    }

    pub fn len(&self) -> usize {
        self.by_layer.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_layer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Point};
    use uuid::Uuid;

    fn pt(id: FeatureId) -> Feature {
        Feature::new(id, Geometry::Point(Point::new(id as f64, 0.0)))
    }

    #[test]
    fn test_select_is_idempotent() {
        let layer = Uuid::new_v4();
        let mut sel = Selection::new();
        sel.select(layer, pt(1));
        sel.select(layer, pt(1));
        sel.select(layer, pt(2));
        assert_eq!(sel.len(), 2);
        assert!(sel.is_selected(layer, 2));
    }

    #[test]
    fn test_unselect_drops_empty_layers() {
        let layer = Uuid::new_v4();
        let mut sel = Selection::new();
        sel.select(layer, pt(1));
        assert!(sel.unselect(layer, 1));
        assert!(!sel.unselect(layer, 1));
        assert!(sel.is_empty());
    }
}
