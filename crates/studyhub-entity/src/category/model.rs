//! Category entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use studyhub_core::traits::store::Row;
use studyhub_core::types::{CategoryId, UserId};

/// A folder in the material hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// The owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Parent category (None for root folders).
    pub parent_id: Option<CategoryId>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Check if this is a root category (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategory {
    /// The owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Parent category (None for root).
    pub parent_id: Option<CategoryId>,
}

/// A change set for an existing category.
///
/// `parent_id: Some(None)` re-parents to the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    /// New display name.
    pub name: Option<String>,
    /// New parent.
    pub parent_id: Option<Option<CategoryId>>,
}

impl CategoryPatch {
    /// A rename.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A re-parent.
    pub fn reparent(parent_id: Option<CategoryId>) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }

    /// Apply the patch to a local copy.
    pub fn apply(&self, category: &mut Category, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(parent_id) = self.parent_id {
            category.parent_id = parent_id;
        }
        category.updated_at = now;
    }

    /// The columns to send to the entity store.
    pub fn to_row(&self, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        if let Some(name) = &self.name {
            row.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(parent_id) = self.parent_id {
            row.insert("parent_id".into(), json!(parent_id));
        }
        row.insert("updated_at".into(), json!(now));
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category() -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(),
            user_id: UserId::new(),
            name: "Math".into(),
            parent_id: Some(CategoryId::new()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reparent_to_root_serializes_null() {
        let row = CategoryPatch::reparent(None).to_row(Utc::now());
        assert_eq!(row.get("parent_id"), Some(&Value::Null));
        assert!(!row.contains_key("name"));
    }

    #[test]
    fn test_apply_rename_keeps_parent() {
        let mut c = category();
        let parent = c.parent_id;
        CategoryPatch::rename("Algebra").apply(&mut c, Utc::now());
        assert_eq!(c.name, "Algebra");
        assert_eq!(c.parent_id, parent);
    }
}
