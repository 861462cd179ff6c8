use thiserror::Error;

use crate::layer::LayerId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Layer {0} is not in the layer stack")]
    UnknownLayer(LayerId),

    #[error("Map request to '{source_name}' failed: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}
