//! # studyhub-service
//!
//! Business logic service layer for StudyHub. Each service orchestrates
//! repositories, the local collection caches, the blob store, and the
//! notification sink to implement one group of use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time. [`Services`] wires a complete set for one session.

pub mod batch;
pub mod category;
pub mod context;
pub mod material;
pub mod notification;
pub mod optimistic;
pub mod tag;
pub mod transfer;

use std::sync::Arc;

use studyhub_cache::keys::{self, CollectionKind};
use studyhub_cache::{CollectionCache, SignedUrlCache};
use studyhub_core::config::AppConfig;
use studyhub_core::traits::{BlobStore, EntityStore, Notifier};
use studyhub_database::repositories::{CategoryRepository, MaterialRepository, TagRepository};

pub use batch::{BatchOperation, BatchReport, BatchService, DirectorySink, DownloadSink, TagEditMode};
pub use category::CategoryService;
pub use context::{SessionContext, StaticIdentity};
pub use material::{
    CategoryScope, MaterialFilter, MaterialService, MaterialSort, MaterialSortField, UploadMaterial,
};
pub use notification::{MemoryNotifier, TracingNotifier};
pub use tag::TagService;
pub use transfer::TransferService;

/// Every service for one session, sharing one set of collection caches.
#[derive(Debug, Clone)]
pub struct Services {
    /// Session the services act for.
    pub ctx: SessionContext,
    /// Category service.
    pub categories: CategoryService,
    /// Tag service.
    pub tags: TagService,
    /// Material service.
    pub materials: MaterialService,
    /// Copy service.
    pub transfer: TransferService,
    /// Batch façade.
    pub batch: BatchService,
}

impl Services {
    /// Wires all services for `ctx`.
    pub fn new(
        ctx: SessionContext,
        store: Arc<dyn EntityStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Self {
        let user_id = ctx.user_id;
        let category_cache = CollectionCache::new(keys::collection(CollectionKind::Categories, &user_id));
        let tag_cache = CollectionCache::new(keys::collection(CollectionKind::Tags, &user_id));
        let material_cache = CollectionCache::new(keys::collection(CollectionKind::Materials, &user_id));
        let trash_cache = CollectionCache::new(keys::collection(CollectionKind::Trash, &user_id));
        let urls = SignedUrlCache::new(
            &config.cache,
            config.storage.bucket.clone(),
            config.storage.signed_url_ttl_seconds,
        );

        let categories = CategoryService::new(
            ctx.clone(),
            Arc::new(CategoryRepository::new(store.clone())),
            category_cache,
            notifier.clone(),
        );
        let tags = TagService::new(
            ctx.clone(),
            Arc::new(TagRepository::new(store.clone())),
            tag_cache.clone(),
            material_cache.clone(),
            notifier.clone(),
        );
        let materials = MaterialService::new(
            ctx.clone(),
            Arc::new(MaterialRepository::new(store)),
            categories.clone(),
            blobs,
            material_cache,
            trash_cache,
            tag_cache,
            urls,
            config.storage.clone(),
            notifier,
        );
        let transfer = TransferService::new(categories.clone(), materials.clone());
        let batch = BatchService::new(materials.clone(), &config.batch);

        Self {
            ctx,
            categories,
            tags,
            materials,
            transfer,
            batch,
        }
    }
}
