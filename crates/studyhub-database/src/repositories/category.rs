//! Category repository implementation.

use std::sync::Arc;

use chrono::Utc;

use studyhub_core::result::AppResult;
use studyhub_core::traits::store::{EntityStore, Table};
use studyhub_core::types::{CategoryId, FilterField, ListQuery, SortField, UserId};
use studyhub_entity::category::{Category, CategoryPatch, CreateCategory};

use super::{from_row, from_rows, to_row};

/// Repository for category CRUD.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    store: Arc<dyn EntityStore>,
}

impl CategoryRepository {
    /// Create a new category repository.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// List every category of a user, ordered by name.
    pub async fn list_for_user(&self, user_id: &UserId) -> AppResult<Vec<Category>> {
        let query = ListQuery::new()
            .filter(FilterField::eq("user_id", user_id))
            .order_by(SortField::asc("name"));
        from_rows(self.store.list(Table::Categories, &query).await?)
    }

    /// Create a new category.
    pub async fn create(&self, data: &CreateCategory) -> AppResult<Category> {
        let row = self.store.insert(Table::Categories, to_row(data)?).await?;
        from_row(row)
    }

    /// Update a category.
    pub async fn update(&self, id: &CategoryId, patch: &CategoryPatch) -> AppResult<()> {
        self.store
            .update(Table::Categories, &id.to_string(), patch.to_row(Utc::now()))
            .await
    }

    /// Delete a category.
    pub async fn delete(&self, id: &CategoryId) -> AppResult<()> {
        self.store.delete(Table::Categories, &id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntityStore;

    #[tokio::test]
    async fn test_create_and_list_ordered() {
        let repo = CategoryRepository::new(Arc::new(MemoryEntityStore::new()));
        let user = UserId::new();
        for name in ["Physics", "Math"] {
            repo.create(&CreateCategory {
                user_id: user,
                name: name.into(),
                parent_id: None,
            })
            .await
            .unwrap();
        }
        let names: Vec<_> = repo
            .list_for_user(&user)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Math", "Physics"]);
        assert!(repo.list_for_user(&UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reparent_to_root() {
        let repo = CategoryRepository::new(Arc::new(MemoryEntityStore::new()));
        let user = UserId::new();
        let parent = repo
            .create(&CreateCategory {
                user_id: user,
                name: "Math".into(),
                parent_id: None,
            })
            .await
            .unwrap();
        let child = repo
            .create(&CreateCategory {
                user_id: user,
                name: "Algebra".into(),
                parent_id: Some(parent.id),
            })
            .await
            .unwrap();
        assert_eq!(child.parent_id, Some(parent.id));

        repo.update(&child.id, &CategoryPatch::reparent(None))
            .await
            .unwrap();
        let all = repo.list_for_user(&user).await.unwrap();
        assert!(all.iter().all(|c| c.parent_id.is_none()));
    }
}
