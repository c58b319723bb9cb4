//! The local workspace a CLI invocation runs against.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use studyhub_core::config::AppConfig;
use studyhub_core::result::AppResult;
use studyhub_core::traits::AuthUser;
use studyhub_core::types::UserId;
use studyhub_database::memory::MemoryEntityStore;
use studyhub_service::{Services, SessionContext, StaticIdentity, TracingNotifier};
use studyhub_storage::LocalBlobStore;

/// Entity data loaded from disk plus the services for the local account.
pub struct Workspace {
    store: Arc<MemoryEntityStore>,
    data_file: String,
    /// Services acting for the local account.
    pub services: Services,
}

impl Workspace {
    /// Loads the data file and opens the blob directory.
    pub async fn open(config: &AppConfig, email: &str) -> AppResult<Self> {
        let store = Arc::new(MemoryEntityStore::load(&config.storage.data_file).await?);
        let blobs = Arc::new(LocalBlobStore::new(&config.storage.blob_root).await?);

        let identity = StaticIdentity::signed_in(local_account(email));
        let ctx = SessionContext::resolve(&identity).await?;
        debug!(user_id = %ctx.user_id, data_file = %config.storage.data_file, "Workspace opened");

        let services = Services::new(ctx, store.clone(), blobs, Arc::new(TracingNotifier), config);
        Ok(Self {
            store,
            data_file: config.storage.data_file.clone(),
            services,
        })
    }

    /// Writes the entity data back to disk.
    pub async fn save(&self) -> AppResult<()> {
        self.store.save(&self.data_file).await
    }
}

/// The single local account. Its id is derived from the email so the same
/// data is found on every run.
fn local_account(email: &str) -> AuthUser {
    let normalized = email.trim().to_lowercase();
    AuthUser {
        id: UserId::from_uuid(Uuid::new_v5(&Uuid::NAMESPACE_URL, normalized.as_bytes())),
        email: normalized,
        metadata: serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_account_is_stable() {
        let a = local_account("Student@Example.com ");
        let b = local_account("student@example.com");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, local_account("other@example.com").id);
    }

    #[tokio::test]
    async fn test_open_and_save_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.storage.data_file = dir.path().join("data.json").display().to_string();
        config.storage.blob_root = dir.path().join("blobs").display().to_string();

        let workspace = Workspace::open(&config, "student@example.com").await.expect("open");
        workspace
            .services
            .categories
            .create("Math", None)
            .await
            .expect("create");
        workspace.save().await.expect("save");

        let reopened = Workspace::open(&config, "student@example.com").await.expect("open");
        let names: Vec<String> = reopened
            .services
            .categories
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Math"]);
    }
}
