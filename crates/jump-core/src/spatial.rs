use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::Envelope;

/// An entry in the R-tree spatial index, referencing a feature by its position.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    /// Index into the collection's feature vector.
    pub feature_index: usize,
    pub envelope: Envelope,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.envelope.min.x, self.envelope.min.y],
            [self.envelope.max.x, self.envelope.max.y],
        )
    }
}

/// Spatial index used for viewport culling.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.tree.size())
            .finish()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        self.tree.insert(entry);
    }

    pub fn query_envelope(&self, envelope: &Envelope) -> Vec<&SpatialEntry> {
        let aabb = AABB::from_corners(
            [envelope.min.x, envelope.min.y],
            [envelope.max.x, envelope.max.y],
        );
        self.tree.locate_in_envelope_intersecting(&aabb).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_query() {
        let index = SpatialIndex::build(vec![
            SpatialEntry {
                feature_index: 0,
                envelope: Envelope::from_coords(0.0, 0.0, 10.0, 10.0),
            },
            SpatialEntry {
                feature_index: 1,
                envelope: Envelope::from_coords(20.0, 20.0, 30.0, 30.0),
            },
        ]);

        let results = index.query_envelope(&Envelope::from_coords(-5.0, -5.0, 15.0, 15.0));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].feature_index, 0);
    }
}
