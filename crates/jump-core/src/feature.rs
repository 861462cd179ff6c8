use serde::{Deserialize, Serialize};

use crate::geometry::{Envelope, Geometry};
use crate::spatial::{SpatialEntry, SpatialIndex};

/// Feature identifier, unique within its layer.
pub type FeatureId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self { id, geometry }
    }
}

/// The features of one layer plus an R-tree over their envelopes.
///
/// Serialized as a plain list of features; the index is rebuilt on load.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Feature>", into = "Vec<Feature>")]
pub struct FeatureCollection {
    features: Vec<Feature>,
    index: SpatialIndex,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        let entries = features
            .iter()
            .enumerate()
            .filter_map(|(feature_index, f)| {
                f.geometry.envelope().map(|envelope| SpatialEntry {
                    feature_index,
                    envelope,
                })
            })
            .collect();
        Self {
            features,
            index: SpatialIndex::build(entries),
        }
    }

    pub fn add(&mut self, feature: Feature) {
        if let Some(envelope) = feature.geometry.envelope() {
            self.index.insert(SpatialEntry {
                feature_index: self.features.len(),
                envelope,
            });
        }
        self.features.push(feature);
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Features whose envelope intersects `envelope`, in insertion order.
    pub fn query(&self, envelope: &Envelope) -> Vec<&Feature> {
        let mut hits: Vec<usize> = self
            .index
            .query_envelope(envelope)
            .into_iter()
            .map(|e| e.feature_index)
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| &self.features[i]).collect()
    }

    pub fn envelope(&self) -> Option<Envelope> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.envelope())
            .reduce(|a, b| a.union(&b))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Clone for FeatureCollection {
    fn clone(&self) -> Self {
        Self::new(self.features.clone())
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self::new(features)
    }
}

impl From<FeatureCollection> for Vec<Feature> {
    fn from(collection: FeatureCollection) -> Self {
        collection.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn square(id: FeatureId, x: f64, y: f64) -> Feature {
        Feature::new(
            id,
            Geometry::Polygon(vec![
                Point::new(x, y),
                Point::new(x + 1.0, y),
                Point::new(x + 1.0, y + 1.0),
                Point::new(x, y + 1.0),
            ]),
        )
    }

    #[test]
    fn test_query_returns_insertion_order() {
        let mut fc = FeatureCollection::new(vec![square(1, 0.0, 0.0), square(2, 50.0, 50.0)]);
        fc.add(square(3, 0.5, 0.5));
        let hits: Vec<FeatureId> = fc
            .query(&Envelope::from_coords(-1.0, -1.0, 2.0, 2.0))
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(hits, vec![1, 3]);
    }

    #[test]
    fn test_json_rebuilds_index() {
        let fc = FeatureCollection::new(vec![square(7, 10.0, 10.0)]);
        let json = serde_json::to_string(&fc).unwrap();
        let back: FeatureCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(
            back.query(&Envelope::from_coords(10.5, 10.5, 10.6, 10.6))[0].id,
            7
        );
        assert_eq!(back.envelope(), Some(Envelope::from_coords(10.0, 10.0, 11.0, 11.0)));
    }
}
