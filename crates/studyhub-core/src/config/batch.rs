//! Batch operation configuration.

use serde::{Deserialize, Serialize};

/// Batch operation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Pause between sequential downloads of a batch.
    #[serde(default = "default_download_delay")]
    pub download_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            download_delay_ms: default_download_delay(),
        }
    }
}

fn default_download_delay() -> u64 {
    300
}
