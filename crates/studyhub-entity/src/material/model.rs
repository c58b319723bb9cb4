//! Material entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use studyhub_core::traits::store::Row;
use studyhub_core::types::{CategoryId, MaterialId, TagId, UserId};

use crate::tag::Tag;

/// An uploaded study file plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Unique material identifier.
    pub id: MaterialId,
    /// The owning user.
    pub user_id: UserId,
    /// Display title.
    pub title: String,
    /// Original file name (including extension).
    pub file_name: String,
    /// Path of the backing blob in the blob store.
    pub file_path: String,
    /// Short file type, usually the lowercase extension.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// Containing category (None for root/unfiled).
    pub category_id: Option<CategoryId>,
    /// Manual ordering key within a folder.
    #[serde(default)]
    pub sort_order: i32,
    /// When the material was created.
    pub created_at: DateTime<Utc>,
    /// When the material was last updated.
    pub updated_at: DateTime<Utc>,
    /// Set when the material is in the trash.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Tags, materialized from the material/tag join. Never stored.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Material {
    /// Whether the material is in the trash.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Ids of the attached tags.
    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }

    /// Whether the material carries the given tag.
    pub fn has_tag(&self, tag_id: &TagId) -> bool {
        self.tags.iter().any(|t| &t.id == tag_id)
    }
}

/// Derive the short file type from a file name.
pub fn file_type_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "file".to_string())
}

/// Data required to create a new material record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMaterial {
    /// The owning user.
    pub user_id: UserId,
    /// Display title.
    pub title: String,
    /// Original file name.
    pub file_name: String,
    /// Blob path.
    pub file_path: String,
    /// Short file type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Target category.
    pub category_id: Option<CategoryId>,
    /// Ordering key.
    pub sort_order: i32,
}

/// A change set for an existing material.
///
/// Doubly optional fields distinguish "leave unchanged" (`None`) from
/// "set to null" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialPatch {
    /// New title.
    pub title: Option<String>,
    /// New category.
    pub category_id: Option<Option<CategoryId>>,
    /// New ordering key.
    pub sort_order: Option<i32>,
    /// Trash marker.
    pub deleted_at: Option<Option<DateTime<Utc>>>,
}

impl MaterialPatch {
    /// Move to another category (`None` = root).
    pub fn move_to(category_id: Option<CategoryId>) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    /// Mark as trashed at `at`.
    pub fn trash(at: DateTime<Utc>) -> Self {
        Self {
            deleted_at: Some(Some(at)),
            ..Self::default()
        }
    }

    /// Clear the trash marker.
    pub fn restore() -> Self {
        Self {
            deleted_at: Some(None),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category_id.is_none()
            && self.sort_order.is_none()
            && self.deleted_at.is_none()
    }

    /// Apply the patch to a local copy.
    pub fn apply(&self, material: &mut Material, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            material.title = title.clone();
        }
        if let Some(category_id) = self.category_id {
            material.category_id = category_id;
        }
        if let Some(sort_order) = self.sort_order {
            material.sort_order = sort_order;
        }
        if let Some(deleted_at) = self.deleted_at {
            material.deleted_at = deleted_at;
        }
        material.updated_at = now;
    }

    /// The columns to send to the entity store.
    pub fn to_row(&self, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        if let Some(title) = &self.title {
            row.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(category_id) = self.category_id {
            row.insert("category_id".into(), json!(category_id));
        }
        if let Some(sort_order) = self.sort_order {
            row.insert("sort_order".into(), json!(sort_order));
        }
        if let Some(deleted_at) = self.deleted_at {
            row.insert("deleted_at".into(), json!(deleted_at));
        }
        row.insert("updated_at".into(), json!(now));
        row
    }
}
