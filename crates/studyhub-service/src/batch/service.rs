//! Batch operations over a material selection.
//!
//! Every batch takes material ids, resolves them against the live
//! collection at call time, and returns one [`BatchReport`]. Local edits are
//! wrapped in a single snapshot: if any item fails, the whole snapshot is
//! restored and the collection is marked for refetch. Items already applied
//! on the store are not compensated.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use studyhub_core::config::batch::BatchConfig;
use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::types::{CategoryId, MaterialId, TagId};
use studyhub_entity::material::{Material, MaterialPatch};

use crate::material::MaterialService;
use crate::optimistic;

/// The kind of batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperation {
    /// Move to trash.
    SoftDelete,
    /// Permanent delete.
    Purge,
    /// Move to a category.
    Move,
    /// Tag edit.
    EditTags,
    /// Download.
    Download,
}

impl BatchOperation {
    fn failure_title(&self) -> &'static str {
        match self {
            Self::SoftDelete => "Failed to move items to trash",
            Self::Purge => "Failed to delete items",
            Self::Move => "Failed to move items",
            Self::EditTags => "Failed to update tags",
            Self::Download => "Failed to download items",
        }
    }
}

/// How a batch tag edit combines with existing tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagEditMode {
    /// Union, without duplicates.
    Add,
    /// Set difference.
    Remove,
    /// Clear, then set.
    Replace,
}

impl TagEditMode {
    /// The resulting tag ids for a material currently carrying `current`.
    pub fn apply(&self, current: &[TagId], tag_ids: &[TagId]) -> Vec<TagId> {
        match self {
            Self::Add => {
                let mut out = current.to_vec();
                for id in tag_ids {
                    if !out.contains(id) {
                        out.push(*id);
                    }
                }
                out
            }
            Self::Remove => current
                .iter()
                .filter(|id| !tag_ids.contains(id))
                .copied()
                .collect(),
            Self::Replace => {
                let mut seen = HashSet::new();
                tag_ids.iter().filter(|id| seen.insert(**id)).copied().collect()
            }
        }
    }
}

/// The aggregate outcome of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Which operation ran.
    pub operation: BatchOperation,
    /// Number of ids requested.
    pub requested: usize,
    /// Items that succeeded.
    pub succeeded: Vec<MaterialId>,
    /// Items that failed, with the error message.
    pub failed: Vec<(MaterialId, String)>,
    /// Requested ids not found in the collection.
    pub missing: Vec<MaterialId>,
}

impl BatchReport {
    fn new(operation: BatchOperation, requested: usize) -> Self {
        Self {
            operation,
            requested,
            succeeded: Vec::new(),
            failed: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Whether the batch as a whole succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, id: MaterialId, result: AppResult<()>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(e) => {
                warn!(operation = ?self.operation, material_id = %id, error = %e, "Batch item failed");
                self.failed.push((id, e.message));
            }
        }
    }
}

/// Destination for batch downloads.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save one downloaded file.
    async fn save(&self, file_name: &str, data: Bytes) -> AppResult<()>;
}

/// Writes downloads into a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: std::path::PathBuf,
}

impl DirectorySink {
    /// Creates a sink writing into `dir`.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, file_name: &str, data: Bytes) -> AppResult<()> {
        let name = std::path::Path::new(file_name)
            .file_name()
            .ok_or_else(|| AppError::validation(format!("Invalid file name '{file_name}'")))?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(name), &data).await?;
        Ok(())
    }
}

/// Batch façade over the material service.
#[derive(Debug, Clone)]
pub struct BatchService {
    /// Material service.
    materials: MaterialService,
    /// Pause between batch downloads.
    download_delay: Duration,
}

impl BatchService {
    /// Creates a new batch service.
    pub fn new(materials: MaterialService, config: &BatchConfig) -> Self {
        Self {
            materials,
            download_delay: Duration::from_millis(config.download_delay_ms),
        }
    }

    /// Resolve ids against the live collection, keeping selection order.
    async fn resolve(&self, ids: &[MaterialId], report: &mut BatchReport) -> AppResult<Vec<Material>> {
        let live = self.reported(report.operation, self.materials.list().await)?;
        Ok(self.pick(&live, ids, report))
    }

    fn reported<R>(&self, operation: BatchOperation, result: AppResult<R>) -> AppResult<R> {
        optimistic::reported(self.materials.notifier(), operation.failure_title(), result)
    }

    fn pick(&self, pool: &[Material], ids: &[MaterialId], report: &mut BatchReport) -> Vec<Material> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            match pool.iter().find(|m| m.id == *id) {
                Some(material) => out.push(material.clone()),
                None => report.missing.push(*id),
            }
        }
        out
    }

    /// Soft-deletes the selection. Requests are issued concurrently.
    pub async fn soft_delete(&self, ids: &[MaterialId]) -> AppResult<BatchReport> {
        let mut report = BatchReport::new(BatchOperation::SoftDelete, ids.len());
        let targets = self.resolve(ids, &mut report).await?;
        let selected: HashSet<MaterialId> = targets.iter().map(|m| m.id).collect();
        let patch = MaterialPatch::trash(Utc::now());
        let repo = self.materials.repo();

        self.run(
            &mut report,
            |items| items.retain(|m| !selected.contains(&m.id)),
            async {
                let requests = targets.iter().map(|m| repo.update(&m.id, &patch));
                let results = join_all(requests).await;
                targets.iter().map(|m| m.id).zip(results).collect()
            },
        )
        .await;
        self.materials.trash_cache().invalidate();
        Ok(self.finish(report))
    }

    /// Permanently deletes the selection, resolved against both the live
    /// and the trashed collections.
    pub async fn purge(&self, ids: &[MaterialId]) -> AppResult<BatchReport> {
        let mut report = BatchReport::new(BatchOperation::Purge, ids.len());
        let pool: AppResult<Vec<Material>> = async {
            let mut pool = self.materials.list().await?;
            pool.extend(self.materials.list_trash().await?);
            Ok(pool)
        }
        .await;
        let pool = self.reported(report.operation, pool)?;
        let targets = self.pick(&pool, ids, &mut report);

        let mut paths = Vec::new();
        for material in &targets {
            let result = self.materials.repo().delete(&material.id).await;
            if result.is_ok() {
                paths.push(material.file_path.clone());
            }
            report.record(material.id, result);
        }
        self.materials.remove_blobs(paths).await;

        let purged: HashSet<MaterialId> = report.succeeded.iter().copied().collect();
        for cache in [self.materials.cache(), self.materials.trash_cache()] {
            cache.mutate(|items| items.retain(|m| !purged.contains(&m.id)));
            cache.invalidate();
        }
        Ok(self.finish(report))
    }

    /// Moves the selection into one category (`None` = root).
    ///
    /// Materials already in `target` are skipped. Requests are sequential.
    /// A `target` that names no existing category fails the whole batch
    /// before anything is dispatched.
    pub async fn move_to(&self, ids: &[MaterialId], target: Option<CategoryId>) -> AppResult<BatchReport> {
        let mut report = BatchReport::new(BatchOperation::Move, ids.len());
        self.reported(
            report.operation,
            self.materials.categories().require_folder(target).await,
        )?;
        let targets: Vec<Material> = self
            .resolve(ids, &mut report)
            .await?
            .into_iter()
            .filter(|m| m.category_id != target)
            .collect();
        let selected: HashSet<MaterialId> = targets.iter().map(|m| m.id).collect();
        let patch = MaterialPatch::move_to(target);
        let now = Utc::now();
        let repo = self.materials.repo();

        self.run(
            &mut report,
            |items| {
                for material in items.iter_mut().filter(|m| selected.contains(&m.id)) {
                    patch.apply(material, now);
                }
            },
            async {
                let mut results = Vec::with_capacity(targets.len());
                for material in &targets {
                    results.push((material.id, repo.update(&material.id, &patch).await));
                }
                results
            },
        )
        .await;
        Ok(self.finish(report))
    }

    /// Edits the tags of the selection. Requests are sequential.
    pub async fn edit_tags(
        &self,
        ids: &[MaterialId],
        mode: TagEditMode,
        tag_ids: &[TagId],
    ) -> AppResult<BatchReport> {
        let mut report = BatchReport::new(BatchOperation::EditTags, ids.len());
        let targets = self.resolve(ids, &mut report).await?;
        let plans: Vec<(MaterialId, Vec<TagId>, Vec<TagId>)> = targets
            .iter()
            .map(|m| {
                let current = m.tag_ids();
                let next = mode.apply(&current, tag_ids);
                (m.id, current, next)
            })
            .collect();
        let local: Vec<(MaterialId, Vec<_>)> = plans
            .iter()
            .map(|(id, _, next)| (*id, self.materials.local_tags(next)))
            .collect();
        let repo = self.materials.repo();

        self.run(
            &mut report,
            |items| {
                for (id, tags) in local {
                    if let Some(material) = items.iter_mut().find(|m| m.id == id) {
                        material.tags = tags;
                    }
                }
            },
            async {
                let mut results = Vec::with_capacity(plans.len());
                for (id, current, next) in &plans {
                    let result = async {
                        match mode {
                            TagEditMode::Replace => repo.set_tags(id, next).await,
                            TagEditMode::Add => {
                                for tag_id in next.iter().filter(|t| !current.contains(t)) {
                                    repo.add_tag(id, tag_id).await?;
                                }
                                Ok(())
                            }
                            TagEditMode::Remove => {
                                for tag_id in current.iter().filter(|t| !next.contains(t)) {
                                    repo.remove_tag(id, tag_id).await?;
                                }
                                Ok(())
                            }
                        }
                    }
                    .await;
                    results.push((*id, result));
                }
                results
            },
        )
        .await;
        Ok(self.finish(report))
    }

    /// Downloads the selection one at a time, pausing between items.
    pub async fn download(&self, ids: &[MaterialId], sink: &dyn DownloadSink) -> AppResult<BatchReport> {
        let mut report = BatchReport::new(BatchOperation::Download, ids.len());
        let targets = self.resolve(ids, &mut report).await?;
        for (index, material) in targets.iter().enumerate() {
            if index > 0 && !self.download_delay.is_zero() {
                tokio::time::sleep(self.download_delay).await;
            }
            let result = async {
                let data = self.materials.blobs().download(&material.file_path).await?;
                sink.save(&material.file_name, data).await
            }
            .await;
            report.record(material.id, result);
        }
        Ok(self.finish(report))
    }

    /// Apply a local edit under one snapshot, dispatch, and roll the whole
    /// snapshot back if any item failed.
    async fn run<Fut>(
        &self,
        report: &mut BatchReport,
        apply: impl FnOnce(&mut Vec<Material>),
        dispatch: Fut,
    ) where
        Fut: std::future::Future<Output = Vec<(MaterialId, AppResult<()>)>>,
    {
        let cache = self.materials.cache();
        cache.cancel_in_flight();
        let snapshot = cache.snapshot();
        cache.mutate(apply);

        for (id, result) in dispatch.await {
            report.record(id, result);
        }
        if !report.is_success() {
            warn!(
                operation = ?report.operation,
                failed = report.failed.len(),
                "Batch failed, restoring snapshot"
            );
            cache.restore(snapshot);
        }
        cache.invalidate();
    }

    fn finish(&self, report: BatchReport) -> BatchReport {
        if report.is_success() {
            info!(
                user_id = %self.materials.ctx().user_id,
                operation = ?report.operation,
                count = report.succeeded.len(),
                "Batch completed"
            );
        } else {
            let error = AppError::store(format!(
                "{} of {} items failed",
                report.failed.len(),
                report.failed.len() + report.succeeded.len()
            ));
            optimistic::report(
                self.materials.notifier(),
                report.operation.failure_title(),
                &error,
            );
        }
        report
    }
}
