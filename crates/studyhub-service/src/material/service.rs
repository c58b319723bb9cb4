//! Material operations: listing, upload, optimistic edits, trash, and purge.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use studyhub_cache::{CollectionCache, SignedUrlCache};
use studyhub_core::config::storage::StorageConfig;
use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::traits::blob::BlobStore;
use studyhub_core::traits::notify::Notifier;
use studyhub_core::types::{CategoryId, MaterialId, TagId, UserId};
use studyhub_database::repositories::MaterialRepository;
use studyhub_entity::material::{CreateMaterial, Material, MaterialPatch, file_type_of};
use studyhub_entity::tag::Tag;
use studyhub_storage::mime::mime_from_path;

use crate::category::CategoryService;
use crate::context::SessionContext;
use crate::optimistic;

use super::search::{MaterialFilter, MaterialSort, search};

/// Request to upload a new material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMaterial {
    /// Display title.
    pub title: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type; guessed from the file name when absent.
    pub mime_type: Option<String>,
    /// Target category (None for root).
    pub category_id: Option<CategoryId>,
    /// Tags to attach.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    /// File contents.
    #[serde(skip)]
    pub data: Bytes,
}

/// Blob path for a new object: `{user_id}/{uuid}.{ext}`.
pub(crate) fn blob_path(user_id: &UserId, file_name: &str) -> String {
    let id = Uuid::new_v4();
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{user_id}/{id}.{}", ext.to_lowercase()),
        _ => format!("{user_id}/{id}"),
    }
}

/// Manages the signed-in user's materials and trash.
#[derive(Clone)]
pub struct MaterialService {
    /// Session context.
    ctx: SessionContext,
    /// Material repository.
    repo: Arc<MaterialRepository>,
    /// Categories, for checking move and upload targets.
    categories: CategoryService,
    /// Blob store holding file contents.
    blobs: Arc<dyn BlobStore>,
    /// Live (non-trashed) materials.
    materials: CollectionCache<Material>,
    /// Trashed materials.
    trash: CollectionCache<Material>,
    /// Tags, used to materialize tag edits locally.
    tags: CollectionCache<Tag>,
    /// Memoized signed URLs.
    urls: SignedUrlCache,
    /// Storage settings.
    config: StorageConfig,
    /// Notification sink.
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for MaterialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialService")
            .field("user_id", &self.ctx.user_id)
            .field("blobs", &self.blobs.provider_type())
            .finish()
    }
}

impl MaterialService {
    /// Creates a new material service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: SessionContext,
        repo: Arc<MaterialRepository>,
        categories: CategoryService,
        blobs: Arc<dyn BlobStore>,
        materials: CollectionCache<Material>,
        trash: CollectionCache<Material>,
        tags: CollectionCache<Tag>,
        urls: SignedUrlCache,
        config: StorageConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ctx,
            repo,
            categories,
            blobs,
            materials,
            trash,
            tags,
            urls,
            config,
            notifier,
        }
    }

    /// The shared live collection.
    pub fn cache(&self) -> &CollectionCache<Material> {
        &self.materials
    }

    /// The shared trash collection.
    pub fn trash_cache(&self) -> &CollectionCache<Material> {
        &self.trash
    }

    pub(crate) fn ctx(&self) -> &SessionContext {
        &self.ctx
    }

    pub(crate) fn repo(&self) -> &MaterialRepository {
        &self.repo
    }

    pub(crate) fn categories(&self) -> &CategoryService {
        &self.categories
    }

    pub(crate) fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Lists live materials, newest first.
    pub async fn list(&self) -> AppResult<Vec<Material>> {
        optimistic::load(&self.materials, || self.repo.list(&self.ctx.user_id, false)).await
    }

    /// Refetches the live collection from the store.
    pub async fn refresh(&self) -> AppResult<Vec<Material>> {
        optimistic::refetch(&self.materials, || self.repo.list(&self.ctx.user_id, false)).await
    }

    /// Lists trashed materials, most recently trashed first.
    pub async fn list_trash(&self) -> AppResult<Vec<Material>> {
        optimistic::load(&self.trash, || self.repo.list(&self.ctx.user_id, true)).await
    }

    /// Searches live materials.
    pub async fn search(&self, filter: &MaterialFilter, sort: MaterialSort) -> AppResult<Vec<Material>> {
        Ok(search(&self.list().await?, filter, sort))
    }

    /// Gets a material, live or trashed.
    pub async fn get(&self, id: MaterialId) -> AppResult<Material> {
        let cached = self
            .materials
            .with(|items| items.iter().find(|m| m.id == id).cloned())
            .flatten();
        if let Some(material) = cached {
            return Ok(material);
        }
        self.repo
            .find_by_id(&id)
            .await?
            .filter(|m| m.user_id == self.ctx.user_id)
            .ok_or_else(|| AppError::not_found(format!("Material {id} not found")))
    }

    /// Uploads a file and creates its material record.
    ///
    /// The blob is removed again if the record cannot be created.
    pub async fn upload(&self, req: UploadMaterial) -> AppResult<Material> {
        let result = self.upload_inner(req).await;
        optimistic::reported(self.notifier.as_ref(), "Upload failed", result)
    }

    async fn upload_inner(&self, req: UploadMaterial) -> AppResult<Material> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }
        if req.data.is_empty() {
            return Err(AppError::validation("File is empty"));
        }
        if req.data.len() as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }
        self.categories.require_folder(req.category_id).await?;

        let path = blob_path(&self.ctx.user_id, &req.file_name);
        let size = req.data.len() as i64;
        self.blobs.upload(&path, req.data).await?;

        let data = CreateMaterial {
            user_id: self.ctx.user_id,
            title: title.to_string(),
            file_type: file_type_of(&req.file_name),
            mime_type: req.mime_type.or_else(|| mime_from_path(&req.file_name)),
            file_name: req.file_name,
            file_path: path.clone(),
            file_size: size,
            category_id: req.category_id,
            sort_order: 0,
        };
        let mut material = match self.repo.create(&data).await {
            Ok(material) => material,
            Err(e) => {
                if let Err(cleanup) = self.blobs.remove(std::slice::from_ref(&path)).await {
                    warn!(path = %path, error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(e);
            }
        };

        if !req.tag_ids.is_empty() {
            match self.repo.set_tags(&material.id, &req.tag_ids).await {
                Ok(()) => material.tags = self.local_tags(&req.tag_ids),
                Err(e) => {
                    warn!(material_id = %material.id, error = %e, "Uploaded without tags");
                    optimistic::report(self.notifier.as_ref(), "Failed to tag material", &e);
                }
            }
        }

        self.materials.mutate(|items| items.insert(0, material.clone()));
        self.materials.invalidate();
        info!(
            user_id = %self.ctx.user_id,
            material_id = %material.id,
            size,
            "Material uploaded"
        );
        Ok(material)
    }

    /// Applies a field edit optimistically.
    pub async fn update(&self, id: MaterialId, patch: MaterialPatch) -> AppResult<()> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return optimistic::reported(
                self.notifier.as_ref(),
                "Failed to update material",
                Err(AppError::validation("Title cannot be empty")),
            );
        }
        self.patch_live(id, patch, "Failed to update material").await
    }

    /// Moves a material to a category (`None` = root).
    ///
    /// Returns `false` when it is already there.
    pub async fn move_to_category(&self, id: MaterialId, target: Option<CategoryId>) -> AppResult<bool> {
        let material = optimistic::reported(
            self.notifier.as_ref(),
            "Failed to move material",
            self.get(id).await,
        )?;
        if material.category_id == target {
            return Ok(false);
        }
        optimistic::reported(
            self.notifier.as_ref(),
            "Failed to move material",
            self.categories.require_folder(target).await,
        )?;
        self.patch_live(id, MaterialPatch::move_to(target), "Failed to move material")
            .await?;
        info!(material_id = %id, target = ?target, "Material moved");
        Ok(true)
    }

    /// Soft-deletes a material.
    pub async fn move_to_trash(&self, id: MaterialId) -> AppResult<()> {
        let patch = MaterialPatch::trash(Utc::now());
        optimistic::mutate(
            &self.materials,
            self.notifier.as_ref(),
            "Failed to move to trash",
            |items| items.retain(|m| m.id != id),
            self.repo.update(&id, &patch),
        )
        .await?;
        self.trash.invalidate();
        info!(user_id = %self.ctx.user_id, material_id = %id, "Material moved to trash");
        Ok(())
    }

    /// Takes a material out of the trash.
    pub async fn restore(&self, id: MaterialId) -> AppResult<()> {
        optimistic::mutate(
            &self.trash,
            self.notifier.as_ref(),
            "Failed to restore material",
            |items| items.retain(|m| m.id != id),
            self.repo.update(&id, &MaterialPatch::restore()),
        )
        .await?;
        self.materials.invalidate();
        info!(user_id = %self.ctx.user_id, material_id = %id, "Material restored");
        Ok(())
    }

    /// Permanently deletes a material record, its tag links, and its blob.
    pub async fn purge(&self, id: MaterialId) -> AppResult<()> {
        let material = optimistic::reported(
            self.notifier.as_ref(),
            "Failed to delete material",
            self.get(id).await,
        )?;
        optimistic::mutate(
            &self.trash,
            self.notifier.as_ref(),
            "Failed to delete material",
            |items| items.retain(|m| m.id != id),
            self.repo.delete(&id),
        )
        .await?;

        self.remove_blobs(vec![material.file_path]).await;
        self.materials.mutate(|items| items.retain(|m| m.id != id));
        self.materials.invalidate();
        info!(user_id = %self.ctx.user_id, material_id = %id, "Material purged");
        Ok(())
    }

    /// Purges every trashed material. Returns how many were removed.
    pub async fn empty_trash(&self) -> AppResult<usize> {
        let trashed = self.list_trash().await?;
        if trashed.is_empty() {
            return Ok(0);
        }

        let purge_all = async {
            for material in &trashed {
                self.repo.delete(&material.id).await?;
            }
            Ok::<(), AppError>(())
        };
        optimistic::mutate(
            &self.trash,
            self.notifier.as_ref(),
            "Failed to empty trash",
            |items| items.clear(),
            purge_all,
        )
        .await?;

        let count = trashed.len();
        self.remove_blobs(trashed.into_iter().map(|m| m.file_path).collect())
            .await;
        info!(user_id = %self.ctx.user_id, count, "Trash emptied");
        Ok(count)
    }

    /// Replaces the tag set of a material.
    pub async fn set_tags(&self, id: MaterialId, tag_ids: Vec<TagId>) -> AppResult<()> {
        let tags = self.local_tags(&tag_ids);
        optimistic::mutate(
            &self.materials,
            self.notifier.as_ref(),
            "Failed to update tags",
            |items| {
                if let Some(material) = items.iter_mut().find(|m| m.id == id) {
                    material.tags = tags;
                }
            },
            self.repo.set_tags(&id, &tag_ids),
        )
        .await
    }

    /// A time-limited URL for previewing or downloading a material.
    pub async fn signed_url(&self, id: MaterialId) -> AppResult<String> {
        let material = self.get(id).await?;
        let path = material.file_path;
        let ttl = self.config.signed_url_ttl_seconds;
        self.urls
            .get_or_sign(&path, || self.blobs.signed_url(&path, ttl))
            .await
    }

    /// The file contents of a material.
    pub async fn download(&self, id: MaterialId) -> AppResult<Bytes> {
        let material = self.get(id).await?;
        self.blobs.download(&material.file_path).await
    }

    /// Tags from the local tag collection, in name order.
    pub(crate) fn local_tags(&self, tag_ids: &[TagId]) -> Vec<Tag> {
        self.tags
            .with(|tags| {
                tags.iter()
                    .filter(|t| tag_ids.contains(&t.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Removes blobs after their records are gone. Failures only orphan
    /// objects, so they are logged rather than returned.
    pub(crate) async fn remove_blobs(&self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        if let Err(e) = self.blobs.remove(&paths).await {
            warn!(count = paths.len(), error = %e, "Failed to remove blobs");
        }
        for path in &paths {
            self.urls.evict(path).await;
        }
    }

    async fn patch_live(&self, id: MaterialId, patch: MaterialPatch, failure: &str) -> AppResult<()> {
        let now = Utc::now();
        optimistic::mutate(
            &self.materials,
            self.notifier.as_ref(),
            failure,
            |items| {
                if let Some(material) = items.iter_mut().find(|m| m.id == id) {
                    patch.apply(material, now);
                }
            },
            self.repo.update(&id, &patch),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::MemoryNotifier;
    use studyhub_core::config::cache::CacheConfig;
    use studyhub_core::error::ErrorKind;
    use studyhub_core::traits::store::Table;
    use studyhub_database::memory::{MemoryEntityStore, StoreOp};
    use studyhub_database::repositories::CategoryRepository;
    use studyhub_storage::{BlobOp, MemoryBlobStore};

    struct Fixture {
        service: MaterialService,
        categories: CategoryService,
        store: Arc<MemoryEntityStore>,
        blobs: Arc<MemoryBlobStore>,
        notifier: MemoryNotifier,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryEntityStore::new());
        let blobs = Arc::new(MemoryBlobStore::new("materials"));
        let notifier = MemoryNotifier::new();
        let config = StorageConfig {
            max_upload_size_bytes: 16,
            ..StorageConfig::default()
        };
        let ctx = SessionContext::new(UserId::new(), "student@example.com");
        let categories = CategoryService::new(
            ctx.clone(),
            Arc::new(CategoryRepository::new(store.clone())),
            CollectionCache::new("categories"),
            Arc::new(notifier.clone()),
        );
        let service = MaterialService::new(
            ctx,
            Arc::new(MaterialRepository::new(store.clone())),
            categories.clone(),
            blobs.clone(),
            CollectionCache::new("materials"),
            CollectionCache::new("trash"),
            CollectionCache::new("tags"),
            SignedUrlCache::new(&CacheConfig::default(), "materials", 3600),
            config,
            Arc::new(notifier.clone()),
        );
        Fixture {
            service,
            categories,
            store,
            blobs,
            notifier,
        }
    }

    fn upload(title: &str) -> UploadMaterial {
        UploadMaterial {
            title: title.into(),
            file_name: format!("{title}.pdf"),
            mime_type: None,
            category_id: None,
            tag_ids: Vec::new(),
            data: Bytes::from_static(b"%PDF-1.7"),
        }
    }

    #[tokio::test]
    async fn test_upload_creates_record_and_blob() {
        let f = fixture();
        let material = f.service.upload(upload("notes")).await.unwrap();
        assert_eq!(material.file_type, "pdf");
        assert_eq!(material.mime_type.as_deref(), Some("application/pdf"));
        assert!(material.file_path.starts_with(&f.service.ctx().user_id.to_string()));
        assert!(f.blobs.contains(&material.file_path));
        assert_eq!(f.service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let f = fixture();
        let mut req = upload("big");
        req.data = Bytes::from(vec![0u8; 17]);
        let err = f.service.upload(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut req = upload("empty");
        req.data = Bytes::new();
        assert!(f.service.upload(req).await.is_err());
        assert!(f.service.upload(upload("  ")).await.is_err());
        assert!(f.blobs.is_empty());
        assert_eq!(f.notifier.error_count(), 3);
    }

    #[tokio::test]
    async fn test_upload_removes_blob_when_insert_fails() {
        let f = fixture();
        f.store.fail_next(Table::Materials, StoreOp::Insert);
        assert!(f.service.upload(upload("notes")).await.is_err());
        assert!(f.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_move_to_trash_rolls_back_exactly() {
        let f = fixture();
        let material = f.service.upload(upload("notes")).await.unwrap();
        f.service.list().await.unwrap();
        let before = f.service.cache().snapshot();
        f.notifier.take();

        f.store.fail_next(Table::Materials, StoreOp::Update);
        assert!(f.service.move_to_trash(material.id).await.is_err());
        assert_eq!(f.service.cache().snapshot(), before);
        assert_eq!(f.notifier.error_count(), 1);
    }

    #[tokio::test]
    async fn test_trash_restore_and_purge() {
        let f = fixture();
        let keep = f.service.upload(upload("keep")).await.unwrap();
        let gone = f.service.upload(upload("gone")).await.unwrap();

        f.service.move_to_trash(keep.id).await.unwrap();
        f.service.move_to_trash(gone.id).await.unwrap();
        assert!(f.service.list().await.unwrap().is_empty());
        assert_eq!(f.service.list_trash().await.unwrap().len(), 2);

        f.service.restore(keep.id).await.unwrap();
        assert_eq!(f.service.list().await.unwrap()[0].id, keep.id);

        f.service.purge(gone.id).await.unwrap();
        assert!(f.service.list_trash().await.unwrap().is_empty());
        assert!(!f.blobs.contains(&gone.file_path));
        assert_eq!(f.store.row_count(Table::Materials), 1);
    }

    #[tokio::test]
    async fn test_empty_trash() {
        let f = fixture();
        for title in ["a", "b"] {
            let m = f.service.upload(upload(title)).await.unwrap();
            f.service.move_to_trash(m.id).await.unwrap();
        }
        assert_eq!(f.service.empty_trash().await.unwrap(), 2);
        assert!(f.blobs.is_empty());
        assert_eq!(f.service.empty_trash().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signed_url_is_memoized() {
        let f = fixture();
        let material = f.service.upload(upload("notes")).await.unwrap();
        let first = f.service.signed_url(material.id).await.unwrap();
        f.blobs.fail_next(BlobOp::Sign);
        let second = f.service.signed_url(material.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_move_to_current_category_is_noop() {
        let f = fixture();
        let material = f.service.upload(upload("notes")).await.unwrap();
        assert!(!f.service.move_to_category(material.id, None).await.unwrap());
        let target = f.categories.create("Physics", None).await.unwrap().id;
        assert!(f.service.move_to_category(material.id, Some(target)).await.unwrap());
        assert_eq!(f.service.get(material.id).await.unwrap().category_id, Some(target));
        assert!(!f.service.move_to_category(material.id, Some(target)).await.unwrap());
    }

    #[tokio::test]
    async fn test_move_into_missing_category_fails() {
        let f = fixture();
        let material = f.service.upload(upload("notes")).await.unwrap();
        f.notifier.take();

        let err = f
            .service
            .move_to_category(material.id, Some(CategoryId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(f.notifier.error_count(), 1);
        let stored = f.service.refresh().await.unwrap();
        assert_eq!(stored[0].category_id, None);
    }

    #[tokio::test]
    async fn test_upload_into_missing_category_fails() {
        let f = fixture();
        let mut req = upload("notes");
        req.category_id = Some(CategoryId::new());
        let err = f.service.upload(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(f.blobs.is_empty());
        assert_eq!(f.store.row_count(Table::Materials), 0);
    }
}
