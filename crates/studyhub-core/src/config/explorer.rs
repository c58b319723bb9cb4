//! File explorer configuration.

use serde::{Deserialize, Serialize};

/// How the explorer lays out items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Cards in a grid.
    #[default]
    Grid,
    /// Rows in a list.
    List,
}

/// File explorer defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Initial view mode.
    #[serde(default)]
    pub default_view_mode: ViewMode,
}
