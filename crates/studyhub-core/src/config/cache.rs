//! Cache configuration.

use serde::{Deserialize, Serialize};

/// Signed URL cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of memoized signed URLs.
    #[serde(default = "default_signed_url_capacity")]
    pub signed_url_capacity: u64,
    /// A memoized URL is dropped this many seconds before it expires.
    #[serde(default = "default_signed_url_margin")]
    pub signed_url_margin_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            signed_url_capacity: default_signed_url_capacity(),
            signed_url_margin_seconds: default_signed_url_margin(),
        }
    }
}

fn default_signed_url_capacity() -> u64 {
    1_000
}

fn default_signed_url_margin() -> u64 {
    60
}
