//! # JUMP Core
//!
//! The model the workbench renders: geometry, features with an R-tree index,
//! the layer stack (vector and server-backed layers), the feature selection,
//! content identifiers and RGBA rasters.

pub mod content;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod layer;
pub mod layer_manager;
pub mod raster;
pub mod selection;
pub mod spatial;
pub mod wms;

pub use content::ContentId;
pub use error::CoreError;
pub use feature::{Feature, FeatureCollection, FeatureId};
pub use geometry::{Envelope, Geometry, Point};
pub use layer::{FillPattern, Layer, LayerId, LayerStyle};
pub use layer_manager::{LayerManager, Layerable};
pub use raster::{clip_segment, Raster, Rgba};
pub use selection::Selection;
pub use wms::{MapRequest, MapSource, WmsLayer};
