//! Copying materials and folder subtrees.
//!
//! A copy never re-parents the source: it gets a new identity, a new blob
//! path, and a record inserted under the target.

use std::collections::HashMap;

use tracing::{info, warn};

use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::types::{CategoryId, MaterialId};
use studyhub_entity::category::{Category, CategoryTree, CreateCategory};
use studyhub_entity::material::{CreateMaterial, Material};

use crate::category::CategoryService;
use crate::material::MaterialService;
use crate::material::service::blob_path;
use crate::optimistic;

/// Copies materials and categories.
#[derive(Debug, Clone)]
pub struct TransferService {
    /// Category service.
    categories: CategoryService,
    /// Material service.
    materials: MaterialService,
}

impl TransferService {
    /// Creates a new transfer service.
    pub fn new(categories: CategoryService, materials: MaterialService) -> Self {
        Self {
            categories,
            materials,
        }
    }

    /// Copies a material (record, blob, and tags) into `target`.
    pub async fn copy_material(&self, id: MaterialId, target: Option<CategoryId>) -> AppResult<Material> {
        let result = async {
            let source = self.materials.get(id).await?;
            self.categories.require_folder(target).await?;
            self.copy_one(&source, target).await
        }
        .await;
        let copy = optimistic::reported(self.materials.notifier(), "Failed to copy material", result)?;

        self.materials.cache().mutate(|items| items.insert(0, copy.clone()));
        self.materials.cache().invalidate();
        info!(source = %id, copy = %copy.id, target = ?target, "Material copied");
        Ok(copy)
    }

    /// Deep-copies a category, its subfolders, and their live materials
    /// into `target`. Returns the new top-level category.
    ///
    /// Copying a folder into itself or one of its descendants is rejected.
    pub async fn copy_category(&self, id: CategoryId, target: Option<CategoryId>) -> AppResult<Category> {
        let result = self.copy_tree(id, target).await;
        let (root, folders, files) =
            optimistic::reported(self.materials.notifier(), "Failed to copy folder", result)?;
        info!(source = %id, copy = %root.id, folders, files, "Folder copied");
        Ok(root)
    }

    async fn copy_tree(
        &self,
        id: CategoryId,
        target: Option<CategoryId>,
    ) -> AppResult<(Category, usize, usize)> {
        let tree = self.categories.tree().await?;
        if !tree.contains(&id) {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        if let Some(t) = target {
            if !tree.contains(&t) {
                return Err(AppError::not_found(format!("Folder {t} not found")));
            }
        }
        if !tree.can_reparent(id, target) {
            return Err(AppError::validation(
                "A folder cannot be copied into itself or one of its subfolders",
            ));
        }

        let mut mapping: HashMap<CategoryId, CategoryId> = HashMap::new();
        let root = self.copy_folder(&tree, id, target).await?;
        mapping.insert(id, root.id);
        for descendant in tree.descendants(id) {
            let parent = tree
                .get(&descendant)
                .and_then(|n| n.category.parent_id)
                .and_then(|p| mapping.get(&p).copied());
            let copy = self.copy_folder(&tree, descendant, parent).await?;
            mapping.insert(descendant, copy.id);
        }
        self.categories.cache().invalidate();

        let materials = self.materials.list().await?;
        let mut files = 0;
        for material in &materials {
            let Some(new_parent) = material.category_id.and_then(|c| mapping.get(&c).copied()) else {
                continue;
            };
            self.copy_one(material, Some(new_parent)).await?;
            files += 1;
        }
        self.materials.cache().invalidate();
        Ok((root, mapping.len(), files))
    }

    async fn copy_folder(
        &self,
        tree: &CategoryTree,
        id: CategoryId,
        parent_id: Option<CategoryId>,
    ) -> AppResult<Category> {
        let name = tree
            .get(&id)
            .map(|n| n.category.name.clone())
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        let data = CreateCategory {
            user_id: self.categories.ctx().user_id,
            name,
            parent_id,
        };
        self.categories.repo().create(&data).await
    }

    async fn copy_one(&self, source: &Material, target: Option<CategoryId>) -> AppResult<Material> {
        let blobs = self.materials.blobs();
        let bytes = blobs.download(&source.file_path).await?;
        let path = blob_path(&self.materials.ctx().user_id, &source.file_name);
        blobs.upload(&path, bytes).await?;

        let data = CreateMaterial {
            user_id: source.user_id,
            title: source.title.clone(),
            file_name: source.file_name.clone(),
            file_path: path.clone(),
            file_type: source.file_type.clone(),
            file_size: source.file_size,
            mime_type: source.mime_type.clone(),
            category_id: target,
            sort_order: source.sort_order,
        };
        let mut copy = match self.materials.repo().create(&data).await {
            Ok(copy) => copy,
            Err(e) => {
                if let Err(cleanup) = blobs.remove(std::slice::from_ref(&path)).await {
                    warn!(path = %path, error = %cleanup, "Failed to remove orphaned copy");
                }
                return Err(e);
            }
        };

        let tag_ids = source.tag_ids();
        if !tag_ids.is_empty() {
            self.materials.repo().set_tags(&copy.id, &tag_ids).await?;
            copy.tags = source.tags.clone();
        }
        Ok(copy)
    }
}
