//! Category CRUD with optimistic rename, move and delete.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use studyhub_cache::CollectionCache;
use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::traits::notify::Notifier;
use studyhub_core::types::CategoryId;
use studyhub_database::repositories::CategoryRepository;
use studyhub_entity::category::{Category, CategoryPatch, CategoryTree, CreateCategory};

use crate::context::SessionContext;
use crate::optimistic;

/// Manages the signed-in user's categories.
#[derive(Debug, Clone)]
pub struct CategoryService {
    /// Session context.
    ctx: SessionContext,
    /// Category repository.
    repo: Arc<CategoryRepository>,
    /// Local category collection.
    cache: CollectionCache<Category>,
    /// Notification sink.
    notifier: Arc<dyn Notifier>,
}

impl CategoryService {
    /// Creates a new category service.
    pub fn new(
        ctx: SessionContext,
        repo: Arc<CategoryRepository>,
        cache: CollectionCache<Category>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ctx,
            repo,
            cache,
            notifier,
        }
    }

    /// The shared local collection.
    pub fn cache(&self) -> &CollectionCache<Category> {
        &self.cache
    }

    pub(crate) fn ctx(&self) -> &SessionContext {
        &self.ctx
    }

    pub(crate) fn repo(&self) -> &CategoryRepository {
        &self.repo
    }

    /// Lists all categories, ordered by name.
    pub async fn list(&self) -> AppResult<Vec<Category>> {
        optimistic::load(&self.cache, || self.repo.list_for_user(&self.ctx.user_id)).await
    }

    /// Refetches the collection from the store.
    pub async fn refresh(&self) -> AppResult<Vec<Category>> {
        optimistic::refetch(&self.cache, || self.repo.list_for_user(&self.ctx.user_id)).await
    }

    /// Builds the category tree from the current collection.
    pub async fn tree(&self) -> AppResult<CategoryTree> {
        Ok(CategoryTree::build(&self.list().await?))
    }

    /// Fails with a not-found error unless `target` is the root or an
    /// existing category.
    pub async fn require_folder(&self, target: Option<CategoryId>) -> AppResult<()> {
        let Some(id) = target else {
            return Ok(());
        };
        if self.list().await?.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Folder {id} not found")))
        }
    }

    /// Creates a category at the root or under `parent_id`.
    pub async fn create(&self, name: &str, parent_id: Option<CategoryId>) -> AppResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return optimistic::reported(
                self.notifier.as_ref(),
                "Failed to create folder",
                Err(AppError::validation("Folder name cannot be empty")),
            );
        }
        if let Some(parent) = parent_id {
            if !self.tree().await?.contains(&parent) {
                return optimistic::reported(
                    self.notifier.as_ref(),
                    "Failed to create folder",
                    Err(AppError::not_found(format!("Parent folder {parent} not found"))),
                );
            }
        }

        let data = CreateCategory {
            user_id: self.ctx.user_id,
            name: name.to_string(),
            parent_id,
        };
        let category = optimistic::reported(
            self.notifier.as_ref(),
            "Failed to create folder",
            self.repo.create(&data).await,
        )?;
        self.cache.mutate(|items| {
            items.push(category.clone());
            items.sort_by(|a, b| a.name.cmp(&b.name));
        });
        self.cache.invalidate();

        info!(
            user_id = %self.ctx.user_id,
            category_id = %category.id,
            parent_id = ?parent_id,
            "Category created"
        );
        Ok(category)
    }

    /// Renames a category.
    pub async fn rename(&self, id: CategoryId, name: &str) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return optimistic::reported(
                self.notifier.as_ref(),
                "Failed to rename folder",
                Err(AppError::validation("Folder name cannot be empty")),
            );
        }
        self.apply_patch(id, CategoryPatch::rename(name), "Failed to rename folder")
            .await
    }

    /// Re-parents a category (`None` = root).
    ///
    /// Returns `false` when the category already lives under `target`.
    /// Moving a category into itself or one of its descendants is rejected
    /// with a validation error before anything is dispatched.
    pub async fn move_to(&self, id: CategoryId, target: Option<CategoryId>) -> AppResult<bool> {
        let tree = self.tree().await?;
        let Some(node) = tree.get(&id) else {
            return optimistic::reported(
                self.notifier.as_ref(),
                "Failed to move folder",
                Err(AppError::not_found(format!("Folder {id} not found"))),
            );
        };
        if let Some(parent) = target {
            if !tree.contains(&parent) {
                return optimistic::reported(
                    self.notifier.as_ref(),
                    "Failed to move folder",
                    Err(AppError::not_found(format!("Folder {parent} not found"))),
                );
            }
        }
        if node.category.parent_id == target {
            return Ok(false);
        }
        if !tree.can_reparent(id, target) {
            return optimistic::reported(
                self.notifier.as_ref(),
                "Cannot move folder",
                Err(AppError::validation(
                    "A folder cannot be moved into itself or one of its subfolders",
                )),
            );
        }

        self.apply_patch(id, CategoryPatch::reparent(target), "Failed to move folder")
            .await?;
        info!(
            user_id = %self.ctx.user_id,
            category_id = %id,
            target = ?target,
            "Category moved"
        );
        Ok(true)
    }

    /// Deletes a category.
    ///
    /// Subfolders and contained materials are left as they are; a subfolder
    /// whose parent is gone shows up as a root.
    pub async fn delete(&self, id: CategoryId) -> AppResult<()> {
        optimistic::mutate(
            &self.cache,
            self.notifier.as_ref(),
            "Failed to delete folder",
            |items| items.retain(|c| c.id != id),
            self.repo.delete(&id),
        )
        .await?;
        info!(user_id = %self.ctx.user_id, category_id = %id, "Category deleted");
        Ok(())
    }

    async fn apply_patch(&self, id: CategoryId, patch: CategoryPatch, failure: &str) -> AppResult<()> {
        let now = Utc::now();
        optimistic::mutate(
            &self.cache,
            self.notifier.as_ref(),
            failure,
            |items| {
                if let Some(category) = items.iter_mut().find(|c| c.id == id) {
                    patch.apply(category, now);
                }
            },
            self.repo.update(&id, &patch),
        )
        .await
    }
}
