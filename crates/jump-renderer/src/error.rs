use std::io;

use thiserror::Error;

use jump_core::CoreError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Rendering has been disposed")]
    Disposed,

    #[error("Failed to spawn render worker: {0}")]
    Spawn(#[from] io::Error),

    #[error("Rendering was cancelled")]
    Cancelled,

    #[error("Fetching map image for '{layer}' failed: {source}")]
    Fetch {
        layer: String,
        #[source]
        source: CoreError,
    },
}
