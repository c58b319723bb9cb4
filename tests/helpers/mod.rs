//! Shared fixtures for the end-to-end tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;

use studyhub_core::config::AppConfig;
use studyhub_core::types::{CategoryId, MaterialId, TagId, UserId};
use studyhub_database::memory::MemoryEntityStore;
use studyhub_explorer::ExplorerViewModel;
use studyhub_service::{MemoryNotifier, Services, SessionContext, UploadMaterial};
use studyhub_storage::MemoryBlobStore;

/// One signed-in user over in-memory stores.
pub struct TestHub {
    /// Services for the user.
    pub services: Services,
    /// Entity store, for failure injection.
    pub store: Arc<MemoryEntityStore>,
    /// Blob store, for failure injection.
    pub blobs: Arc<MemoryBlobStore>,
    /// Every notification sent.
    pub notifier: MemoryNotifier,
}

impl TestHub {
    /// A fresh hub with default configuration.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.batch.download_delay_ms = 0;
        let store = Arc::new(MemoryEntityStore::new());
        let blobs = Arc::new(MemoryBlobStore::new("materials"));
        let notifier = MemoryNotifier::new();
        let services = Services::new(
            SessionContext::new(UserId::new(), "student@example.com"),
            store.clone(),
            blobs.clone(),
            Arc::new(notifier.clone()),
            &config,
        );
        Self {
            services,
            store,
            blobs,
            notifier,
        }
    }

    /// An explorer over this hub's services.
    pub fn explorer(&self) -> ExplorerViewModel {
        ExplorerViewModel::new(
            self.services.clone(),
            Arc::new(self.notifier.clone()),
            &Default::default(),
        )
    }

    /// Creates a folder.
    pub async fn folder(&self, name: &str, parent: Option<CategoryId>) -> CategoryId {
        self.services
            .categories
            .create(name, parent)
            .await
            .expect("create folder")
            .id
    }

    /// Creates a tag.
    pub async fn tag(&self, name: &str) -> TagId {
        self.services.tags.create(name, None).await.expect("create tag").id
    }

    /// Uploads a small text file.
    pub async fn upload(&self, title: &str, folder: Option<CategoryId>, tags: &[TagId]) -> MaterialId {
        self.services
            .materials
            .upload(UploadMaterial {
                title: title.to_string(),
                file_name: format!("{title}.txt"),
                mime_type: None,
                category_id: folder,
                tag_ids: tags.to_vec(),
                data: Bytes::from(format!("contents of {title}")),
            })
            .await
            .expect("upload")
            .id
    }
}
