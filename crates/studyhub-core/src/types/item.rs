//! Discriminated explorer item keys.
//!
//! The explorer mixes folders and materials in one selection. Each item is
//! addressed by a string of the form `folder-<uuid>` or `material-<uuid>`,
//! which is also the marker carried by selectable elements in the view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::{CategoryId, MaterialId};
use crate::error::AppError;

const FOLDER_PREFIX: &str = "folder-";
const MATERIAL_PREFIX: &str = "material-";

/// A folder or material in the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    /// A category shown as a folder.
    Folder(CategoryId),
    /// A material shown as a file.
    Material(MaterialId),
}

impl ItemKey {
    /// The folder id, if this key names a folder.
    pub fn as_folder(&self) -> Option<CategoryId> {
        match self {
            Self::Folder(id) => Some(*id),
            Self::Material(_) => None,
        }
    }

    /// The material id, if this key names a material.
    pub fn as_material(&self) -> Option<MaterialId> {
        match self {
            Self::Material(id) => Some(*id),
            Self::Folder(_) => None,
        }
    }

    /// Whether this key names a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

impl From<CategoryId> for ItemKey {
    fn from(id: CategoryId) -> Self {
        Self::Folder(id)
    }
}

impl From<MaterialId> for ItemKey {
    fn from(id: MaterialId) -> Self {
        Self::Material(id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder(id) => write!(f, "{FOLDER_PREFIX}{id}"),
            Self::Material(id) => write!(f, "{MATERIAL_PREFIX}{id}"),
        }
    }
}

impl FromStr for ItemKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid item key: '{s}'"));
        if let Some(rest) = s.strip_prefix(FOLDER_PREFIX) {
            rest.parse().map(Self::Folder).map_err(|_| invalid())
        } else if let Some(rest) = s.strip_prefix(MATERIAL_PREFIX) {
            rest.parse().map(Self::Material).map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    }
}

impl Serialize for ItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_format() {
        let id = CategoryId::new();
        assert_eq!(ItemKey::Folder(id).to_string(), format!("folder-{id}"));
    }

    #[test]
    fn test_parse_material_key() {
        let id = MaterialId::new();
        let key: ItemKey = format!("material-{id}").parse().expect("parse");
        assert_eq!(key, ItemKey::Material(id));
        assert_eq!(key.as_material(), Some(id));
        assert_eq!(key.as_folder(), None);
    }

    #[test]
    fn test_parse_rejects_unknown_prefix() {
        let err = "file-123".parse::<ItemKey>().unwrap_err();
        assert!(err.is_validation());
        assert!("folder-not-a-uuid".parse::<ItemKey>().is_err());
    }
}
