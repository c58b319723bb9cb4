//! Material repository implementation.
//!
//! Materials are returned with their tags materialized from the
//! material/tag join table.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use studyhub_core::error::ErrorKind;
use studyhub_core::result::AppResult;
use studyhub_core::traits::store::{EntityStore, Table};
use studyhub_core::types::{FilterField, ListQuery, MaterialId, SortField, TagId, UserId};
use studyhub_entity::material::{CreateMaterial, Material, MaterialPatch};
use studyhub_entity::tag::{MaterialTag, Tag};

use super::{from_row, from_rows, to_row};

/// Repository for material CRUD and tag assignment.
#[derive(Debug, Clone)]
pub struct MaterialRepository {
    store: Arc<dyn EntityStore>,
}

impl MaterialRepository {
    /// Create a new material repository.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// List a user's live materials (newest first) or trashed materials
    /// (most recently trashed first).
    pub async fn list(&self, user_id: &UserId, trashed: bool) -> AppResult<Vec<Material>> {
        let query = ListQuery::new().filter(FilterField::eq("user_id", user_id));
        let query = if trashed {
            query
                .filter(FilterField::is_not_null("deleted_at"))
                .order_by(SortField::desc("deleted_at"))
        } else {
            query
                .filter(FilterField::is_null("deleted_at"))
                .order_by(SortField::desc("created_at"))
        };
        let materials: Vec<Material> = from_rows(self.store.list(Table::Materials, &query).await?)?;
        self.attach_tags(user_id, materials).await
    }

    /// Find a single material by id, trashed or not.
    pub async fn find_by_id(&self, id: &MaterialId) -> AppResult<Option<Material>> {
        let query = ListQuery::new().filter(FilterField::eq("id", id));
        let Some(row) = self.store.list(Table::Materials, &query).await?.pop() else {
            return Ok(None);
        };
        let material: Material = from_row(row)?;
        let user_id = material.user_id;
        Ok(self.attach_tags(&user_id, vec![material]).await?.pop())
    }

    /// Create a new material record.
    pub async fn create(&self, data: &CreateMaterial) -> AppResult<Material> {
        let row = self.store.insert(Table::Materials, to_row(data)?).await?;
        from_row(row)
    }

    /// Update a material.
    pub async fn update(&self, id: &MaterialId, patch: &MaterialPatch) -> AppResult<()> {
        self.store
            .update(Table::Materials, &id.to_string(), patch.to_row(Utc::now()))
            .await
    }

    /// Permanently delete a material record and its tag assignments.
    pub async fn delete(&self, id: &MaterialId) -> AppResult<()> {
        self.store
            .delete_where(Table::MaterialTags, &[FilterField::eq("material_id", id)])
            .await?;
        self.store.delete(Table::Materials, &id.to_string()).await
    }

    /// Ids of the tags attached to a material.
    pub async fn tag_ids(&self, id: &MaterialId) -> AppResult<Vec<TagId>> {
        let query = ListQuery::new().filter(FilterField::eq("material_id", id));
        let pairs: Vec<MaterialTag> = from_rows(self.store.list(Table::MaterialTags, &query).await?)?;
        Ok(pairs.into_iter().map(|p| p.tag_id).collect())
    }

    /// Replace the tag set of a material.
    pub async fn set_tags(&self, id: &MaterialId, tag_ids: &[TagId]) -> AppResult<()> {
        self.store
            .delete_where(Table::MaterialTags, &[FilterField::eq("material_id", id)])
            .await?;
        let mut seen = Vec::with_capacity(tag_ids.len());
        for tag_id in tag_ids {
            if seen.contains(tag_id) {
                continue;
            }
            seen.push(*tag_id);
            self.insert_pair(id, tag_id).await?;
        }
        debug!(material_id = %id, tags = seen.len(), "Replaced material tags");
        Ok(())
    }

    /// Attach a tag. Attaching an already-present tag is a no-op.
    pub async fn add_tag(&self, id: &MaterialId, tag_id: &TagId) -> AppResult<()> {
        match self.insert_pair(id, tag_id).await {
            Err(e) if e.kind == ErrorKind::Conflict => Ok(()),
            other => other,
        }
    }

    /// Detach a tag.
    pub async fn remove_tag(&self, id: &MaterialId, tag_id: &TagId) -> AppResult<()> {
        self.store
            .delete_where(
                Table::MaterialTags,
                &[
                    FilterField::eq("material_id", id),
                    FilterField::eq("tag_id", tag_id),
                ],
            )
            .await?;
        Ok(())
    }

    async fn insert_pair(&self, id: &MaterialId, tag_id: &TagId) -> AppResult<()> {
        let pair = MaterialTag {
            material_id: *id,
            tag_id: *tag_id,
        };
        self.store.insert(Table::MaterialTags, to_row(&pair)?).await?;
        Ok(())
    }

    async fn attach_tags(
        &self,
        user_id: &UserId,
        mut materials: Vec<Material>,
    ) -> AppResult<Vec<Material>> {
        if materials.is_empty() {
            return Ok(materials);
        }
        let ids = materials.iter().map(|m| m.id);
        let pairs: Vec<MaterialTag> = from_rows(
            self.store
                .list(
                    Table::MaterialTags,
                    &ListQuery::new().filter(FilterField::in_list("material_id", ids)),
                )
                .await?,
        )?;
        if pairs.is_empty() {
            return Ok(materials);
        }

        let tags: Vec<Tag> = from_rows(
            self.store
                .list(
                    Table::Tags,
                    &ListQuery::new()
                        .filter(FilterField::eq("user_id", user_id))
                        .order_by(SortField::asc("name")),
                )
                .await?,
        )?;
        let mut assigned: HashMap<MaterialId, Vec<TagId>> = HashMap::new();
        for pair in pairs {
            assigned.entry(pair.material_id).or_default().push(pair.tag_id);
        }
        for material in &mut materials {
            if let Some(tag_ids) = assigned.get(&material.id) {
                material.tags = tags
                    .iter()
                    .filter(|t| tag_ids.contains(&t.id))
                    .cloned()
                    .collect();
            }
        }
        Ok(materials)
    }
}
