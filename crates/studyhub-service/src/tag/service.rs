//! Tag CRUD. Tag names are unique per user, ignoring case.

use std::sync::Arc;

use tracing::info;

use studyhub_cache::CollectionCache;
use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::traits::notify::Notifier;
use studyhub_core::types::TagId;
use studyhub_database::repositories::TagRepository;
use studyhub_entity::material::Material;
use studyhub_entity::tag::{CreateTag, Tag, TagPatch};

use crate::context::SessionContext;
use crate::optimistic;

/// Color given to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#3b82f6";

/// Manages the signed-in user's tags.
#[derive(Debug, Clone)]
pub struct TagService {
    /// Session context.
    ctx: SessionContext,
    /// Tag repository.
    repo: Arc<TagRepository>,
    /// Local tag collection.
    cache: CollectionCache<Tag>,
    /// Material collection, whose materialized tags go stale on tag edits.
    materials: CollectionCache<Material>,
    /// Notification sink.
    notifier: Arc<dyn Notifier>,
}

impl TagService {
    /// Creates a new tag service.
    pub fn new(
        ctx: SessionContext,
        repo: Arc<TagRepository>,
        cache: CollectionCache<Tag>,
        materials: CollectionCache<Material>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ctx,
            repo,
            cache,
            materials,
            notifier,
        }
    }

    /// The shared local collection.
    pub fn cache(&self) -> &CollectionCache<Tag> {
        &self.cache
    }

    /// Lists all tags, ordered by name.
    pub async fn list(&self) -> AppResult<Vec<Tag>> {
        optimistic::load(&self.cache, || self.repo.list_for_user(&self.ctx.user_id)).await
    }

    /// Finds a tag by name, ignoring case.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        let name = name.trim();
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name)))
    }

    /// Creates a tag.
    pub async fn create(&self, name: &str, color: Option<&str>) -> AppResult<Tag> {
        let result = self.create_inner(name, color).await;
        optimistic::reported(self.notifier.as_ref(), "Failed to create tag", result)
    }

    async fn create_inner(&self, name: &str, color: Option<&str>) -> AppResult<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Tag name cannot be empty"));
        }
        if self.find_by_name(name).await?.is_some() {
            return Err(AppError::conflict(format!("Tag '{name}' already exists")));
        }

        let data = CreateTag {
            user_id: self.ctx.user_id,
            name: name.to_string(),
            color: color.unwrap_or(DEFAULT_TAG_COLOR).to_string(),
        };
        let tag = self.repo.create(&data).await?;
        self.cache.mutate(|items| {
            items.push(tag.clone());
            items.sort_by(|a, b| a.name.cmp(&b.name));
        });
        self.cache.invalidate();
        info!(user_id = %self.ctx.user_id, tag_id = %tag.id, name = %tag.name, "Tag created");
        Ok(tag)
    }

    /// Renames or recolors a tag.
    pub async fn update(&self, id: TagId, patch: TagPatch) -> AppResult<()> {
        if let Some(name) = &patch.name {
            let clash = match self.find_by_name(name).await? {
                Some(existing) => existing.id != id,
                None => false,
            };
            let invalid = if name.trim().is_empty() {
                Some(AppError::validation("Tag name cannot be empty"))
            } else if clash {
                Some(AppError::conflict(format!("Tag '{}' already exists", name.trim())))
            } else {
                None
            };
            if let Some(e) = invalid {
                return optimistic::reported(self.notifier.as_ref(), "Failed to update tag", Err(e));
            }
        }

        optimistic::mutate(
            &self.cache,
            self.notifier.as_ref(),
            "Failed to update tag",
            |items| {
                if let Some(tag) = items.iter_mut().find(|t| t.id == id) {
                    patch.apply(tag);
                }
            },
            self.repo.update(&id, &patch),
        )
        .await?;
        self.materials.invalidate();
        Ok(())
    }

    /// Deletes a tag and detaches it from every material.
    pub async fn delete(&self, id: TagId) -> AppResult<()> {
        optimistic::mutate(
            &self.cache,
            self.notifier.as_ref(),
            "Failed to delete tag",
            |items| items.retain(|t| t.id != id),
            self.repo.delete(&id),
        )
        .await?;
        self.materials.invalidate();
        info!(user_id = %self.ctx.user_id, tag_id = %id, "Tag deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::MemoryNotifier;
    use studyhub_core::error::ErrorKind;
    use studyhub_core::types::UserId;
    use studyhub_database::memory::MemoryEntityStore;

    fn setup() -> (TagService, MemoryNotifier) {
        let store = Arc::new(MemoryEntityStore::new());
        let notifier = MemoryNotifier::new();
        let service = TagService::new(
            SessionContext::new(UserId::new(), "student@example.com"),
            Arc::new(TagRepository::new(store)),
            CollectionCache::new("tags"),
            CollectionCache::new("materials"),
            Arc::new(notifier.clone()),
        );
        (service, notifier)
    }

    #[tokio::test]
    async fn test_names_are_unique_ignoring_case() {
        let (service, notifier) = setup();
        let exam = service.create("Exam", None).await.unwrap();
        assert_eq!(exam.color, DEFAULT_TAG_COLOR);

        let err = service.create(" exam ", Some("#000000")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(notifier.error_count(), 1);
    }

    #[tokio::test]
    async fn test_rename_to_own_name_with_other_case() {
        let (service, _) = setup();
        let exam = service.create("exam", None).await.unwrap();
        let patch = TagPatch {
            name: Some("Exam".into()),
            color: None,
        };
        service.update(exam.id, patch).await.unwrap();
        let tags = service.list().await.unwrap();
        assert_eq!(tags[0].name, "Exam");
    }

    #[tokio::test]
    async fn test_delete_invalidates_materials() {
        let (service, _) = setup();
        let exam = service.create("exam", None).await.unwrap();
        service.materials.set(Vec::new());
        service.delete(exam.id).await.unwrap();
        assert!(service.materials.is_stale());
        assert!(service.list().await.unwrap().is_empty());
    }
}
