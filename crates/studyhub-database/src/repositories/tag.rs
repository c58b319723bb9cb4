//! Tag repository implementation.

use std::sync::Arc;

use studyhub_core::result::AppResult;
use studyhub_core::traits::store::{EntityStore, Table};
use studyhub_core::types::{FilterField, ListQuery, SortField, TagId, UserId};
use studyhub_entity::tag::{CreateTag, Tag, TagPatch};

use super::{from_row, from_rows, to_row};

/// Repository for tag CRUD.
#[derive(Debug, Clone)]
pub struct TagRepository {
    store: Arc<dyn EntityStore>,
}

impl TagRepository {
    /// Create a new tag repository.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// List every tag of a user, ordered by name.
    pub async fn list_for_user(&self, user_id: &UserId) -> AppResult<Vec<Tag>> {
        let query = ListQuery::new()
            .filter(FilterField::eq("user_id", user_id))
            .order_by(SortField::asc("name"));
        from_rows(self.store.list(Table::Tags, &query).await?)
    }

    /// Create a new tag.
    pub async fn create(&self, data: &CreateTag) -> AppResult<Tag> {
        let row = self.store.insert(Table::Tags, to_row(data)?).await?;
        from_row(row)
    }

    /// Update a tag.
    pub async fn update(&self, id: &TagId, patch: &TagPatch) -> AppResult<()> {
        self.store
            .update(Table::Tags, &id.to_string(), patch.to_row())
            .await
    }

    /// Delete a tag, detaching it from every material first.
    pub async fn delete(&self, id: &TagId) -> AppResult<()> {
        self.store
            .delete_where(Table::MaterialTags, &[FilterField::eq("tag_id", id)])
            .await?;
        self.store.delete(Table::Tags, &id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntityStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_delete_removes_join_rows() {
        let store = Arc::new(MemoryEntityStore::new());
        let repo = TagRepository::new(store.clone());
        let tag = repo
            .create(&CreateTag {
                user_id: UserId::new(),
                name: "exam".into(),
                color: "#ef4444".into(),
            })
            .await
            .unwrap();
        let pair = json!({"material_id": "m1", "tag_id": tag.id});
        store
            .insert(Table::MaterialTags, pair.as_object().cloned().unwrap())
            .await
            .unwrap();

        repo.delete(&tag.id).await.unwrap();
        assert_eq!(store.row_count(Table::MaterialTags), 0);
        assert_eq!(store.row_count(Table::Tags), 0);
    }
}
