//! Storage configuration.

use serde::{Deserialize, Serialize};

/// Entity data and blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file backing the local entity store.
    #[serde(default = "default_data_file")]
    pub data_file: String,
    /// Root directory of the local blob store.
    #[serde(default = "default_blob_root")]
    pub blob_root: String,
    /// Bucket name used in public and signed URLs.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Lifetime of signed preview/download URLs.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_seconds: u64,
    /// Maximum upload size in bytes (default 50 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            blob_root: default_blob_root(),
            bucket: default_bucket(),
            signed_url_ttl_seconds: default_signed_url_ttl(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_data_file() -> String {
    "./data/studyhub.json".to_string()
}

fn default_blob_root() -> String {
    "./data/blobs".to_string()
}

fn default_bucket() -> String {
    "materials".to_string()
}

fn default_signed_url_ttl() -> u64 {
    3600
}

fn default_max_upload() -> u64 {
    52_428_800 // 50 MB
}
