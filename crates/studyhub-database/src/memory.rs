//! In-process entity store.
//!
//! Rows are kept per table in a concurrent map and can be persisted to a
//! single JSON file. The store generates `id`, `created_at` and
//! `updated_at` columns on insert when the caller omits them, and enforces
//! uniqueness of the material/tag pair.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Value, json};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_core::traits::store::{EntityStore, Row, Table};
use studyhub_core::types::filter::{FilterField, ListQuery};

/// Store operations that can be made to fail in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// [`EntityStore::list`].
    List,
    /// [`EntityStore::insert`].
    Insert,
    /// [`EntityStore::update`].
    Update,
    /// [`EntityStore::delete`].
    Delete,
    /// [`EntityStore::delete_where`].
    DeleteWhere,
}

/// Entity store keeping every table in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntityStore {
    tables: Arc<DashMap<Table, Vec<Row>>>,
    failures: Arc<DashMap<(Table, StoreOp), u32>>,
}

impl MemoryEntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `op` on `table` fail with a store error.
    pub fn fail_next(&self, table: Table, op: StoreOp) {
        *self.failures.entry((table, op)).or_insert(0) += 1;
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: Table) -> usize {
        self.tables.get(&table).map(|rows| rows.len()).unwrap_or(0)
    }

    /// Load a store previously written by [`MemoryEntityStore::save`].
    ///
    /// A missing file yields an empty store.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let store = Self::new();
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No data file, starting empty");
                return Ok(store);
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Store,
                    format!("Failed to read data file: {}", path.display()),
                    e,
                ));
            }
        };

        let tables: BTreeMap<String, Vec<Row>> = serde_json::from_slice(&raw)?;
        for (name, rows) in tables {
            let table = Table::from_name(&name).ok_or_else(|| {
                AppError::store(format!("Unknown table '{name}' in {}", path.display()))
            })?;
            store.tables.insert(table, rows);
        }
        info!(path = %path.display(), "Loaded entity store");
        Ok(store)
    }

    /// Write every table to `path` as JSON, replacing the file atomically.
    pub async fn save(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let tables: BTreeMap<&str, Vec<Row>> = Table::ALL
            .iter()
            .map(|t| {
                let rows = self.tables.get(t).map(|r| r.clone()).unwrap_or_default();
                (t.name(), rows)
            })
            .collect();
        let data = serde_json::to_vec_pretty(&tables)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &data).await?;
        fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), bytes = data.len(), "Saved entity store");
        Ok(())
    }

    fn check(&self, table: Table, op: StoreOp) -> AppResult<()> {
        if let Some(mut remaining) = self.failures.get_mut(&(table, op)) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::store(format!(
                    "Injected {op:?} failure on {table}"
                )));
            }
        }
        Ok(())
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn same_pair(a: &Row, b: &Row) -> bool {
    a.get("material_id") == b.get("material_id") && a.get("tag_id") == b.get("tag_id")
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn list(&self, table: Table, query: &ListQuery) -> AppResult<Vec<Row>> {
        self.check(table, StoreOp::List)?;
        let mut rows: Vec<Row> = self
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if !query.order.is_empty() {
            rows.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|sort| sort.compare(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut fields: Row) -> AppResult<Row> {
        self.check(table, StoreOp::Insert)?;
        let now = json!(Utc::now());
        if table.has_id() {
            fields
                .entry("id")
                .or_insert_with(|| json!(Uuid::new_v4()));
        }
        if table != Table::MaterialTags {
            fields.entry("created_at").or_insert_with(|| now.clone());
        }
        if matches!(table, Table::Categories | Table::Materials) {
            fields.entry("updated_at").or_insert(now);
        }

        let mut rows = self.tables.entry(table).or_default();
        if table == Table::MaterialTags && rows.iter().any(|r| same_pair(r, &fields)) {
            return Err(AppError::conflict("Tag is already applied to this material"));
        }
        if let Some(id) = row_id(&fields) {
            if rows.iter().any(|r| row_id(r) == Some(id)) {
                return Err(AppError::conflict(format!("Duplicate id {id} in {table}")));
            }
        }
        rows.push(fields.clone());
        Ok(fields)
    }

    async fn update(&self, table: Table, id: &str, fields: Row) -> AppResult<()> {
        self.check(table, StoreOp::Update)?;
        let mut rows = self.tables.entry(table).or_default();
        let row = rows
            .iter_mut()
            .find(|r| row_id(r) == Some(id))
            .ok_or_else(|| AppError::not_found(format!("No row {id} in {table}")))?;
        for (column, value) in fields {
            if column != "id" {
                row.insert(column, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> AppResult<()> {
        self.check(table, StoreOp::Delete)?;
        let mut rows = self.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        if rows.len() == before {
            return Err(AppError::not_found(format!("No row {id} in {table}")));
        }
        Ok(())
    }

    async fn delete_where(&self, table: Table, filters: &[FilterField]) -> AppResult<u64> {
        self.check(table, StoreOp::DeleteWhere)?;
        let mut rows = self.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| !filters.iter().all(|f| f.matches(r)));
        Ok((before - rows.len()) as u64)
    }
}
