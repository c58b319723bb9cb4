//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field has a default so that a missing file yields
//! a usable configuration.

pub mod batch;
pub mod cache;
pub mod explorer;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

use self::batch::BatchConfig;
use self::cache::CacheConfig;
use self::explorer::ExplorerConfig;
use self::logging::LoggingConfig;
use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Entity data file and blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Signed URL cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Batch operation settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// File explorer defaults.
    #[serde(default)]
    pub explorer: ExplorerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the base file with an environment-specific overlay and
    /// environment variables prefixed with `STUDYHUB__`.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let base = path.trim_end_matches(".toml");
        let overlay = match base.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{env}"),
            None => env.to_string(),
        };

        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&overlay).required(false))
            .add_source(
                config::Environment::with_prefix("STUDYHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_yield_defaults() {
        let config = AppConfig::load("does/not/exist.toml", "nowhere").expect("load");
        assert_eq!(config.storage.signed_url_ttl_seconds, 3600);
        assert_eq!(config.batch.download_delay_ms, 300);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[batch]\ndownload_delay_ms = 50\n",
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("deserialize");
        assert_eq!(config.batch.download_delay_ms, 50);
        assert_eq!(config.storage.bucket, "materials");
    }
}
