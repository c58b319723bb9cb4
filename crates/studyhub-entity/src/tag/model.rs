//! Tag entity model and the material/tag join row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use studyhub_core::traits::store::Row;
use studyhub_core::types::{MaterialId, TagId, UserId};

/// A user-defined label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Unique tag identifier.
    pub id: TagId,
    /// The owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Display color, e.g. `#3b82f6`.
    pub color: String,
    /// When the tag was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTag {
    /// The owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: String,
}

/// A change set for an existing tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPatch {
    /// New name.
    pub name: Option<String>,
    /// New color.
    pub color: Option<String>,
}

impl TagPatch {
    /// Apply the patch to a local copy.
    pub fn apply(&self, tag: &mut Tag) {
        if let Some(name) = &self.name {
            tag.name = name.clone();
        }
        if let Some(color) = &self.color {
            tag.color = color.clone();
        }
    }

    /// The columns to send to the entity store.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        if let Some(name) = &self.name {
            row.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(color) = &self.color {
            row.insert("color".into(), Value::String(color.clone()));
        }
        row
    }
}

/// One row of the material/tag relation. The pair is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialTag {
    /// The tagged material.
    pub material_id: MaterialId,
    /// The applied tag.
    pub tag_id: TagId,
}
