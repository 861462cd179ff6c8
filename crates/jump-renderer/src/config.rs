use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the rendering manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Concurrency of the queue that draws local layers and overlays.
    pub default_queue_threads: usize,
    /// Concurrency of the queue that fetches server-backed layers.
    pub server_queue_threads: usize,
    /// Period of the progressive repaint while anything is still drawing.
    pub repaint_interval_ms: u64,
    /// Collapse repaint ticks missed while a repaint was running into one.
    pub coalesce_repaints: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            default_queue_threads: 1,
            server_queue_threads: 20,
            repaint_interval_ms: 1000,
            coalesce_repaints: true,
        }
    }
}

impl RenderingConfig {
    pub fn repaint_interval(&self) -> Duration {
        Duration::from_millis(self.repaint_interval_ms)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
