//! Entity store trait for the hosted relational backend.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::filter::{FilterField, ListQuery};

/// A serialized record: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The tables the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Folder hierarchy records.
    Categories,
    /// Uploaded file records.
    Materials,
    /// User-defined labels.
    Tags,
    /// The material to tag join relation. Rows have no `id` column.
    MaterialTags,
}

impl Table {
    /// Every table.
    pub const ALL: [Table; 4] = [
        Table::Categories,
        Table::Materials,
        Table::Tags,
        Table::MaterialTags,
    ];

    /// Look a table up by its store name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// The table name as known to the store.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Materials => "materials",
            Self::Tags => "tags",
            Self::MaterialTags => "material_tags",
        }
    }

    /// Whether rows of this table carry an `id` primary key.
    pub fn has_id(&self) -> bool {
        !matches!(self, Self::MaterialTags)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CRUD access to the external entity store.
///
/// The trait is expressed in terms of serialized rows so that a single
/// backend object can serve every table; typed access lives in the
/// repositories of `studyhub-database`.
#[async_trait]
pub trait EntityStore: Send + Sync + fmt::Debug + 'static {
    /// List rows matching the query, in the requested order.
    async fn list(&self, table: Table, query: &ListQuery) -> AppResult<Vec<Row>>;

    /// Insert a row and return the stored version (with generated columns).
    async fn insert(&self, table: Table, fields: Row) -> AppResult<Row>;

    /// Update the given columns of the row with primary key `id`.
    async fn update(&self, table: Table, id: &str, fields: Row) -> AppResult<()>;

    /// Delete the row with primary key `id`.
    async fn delete(&self, table: Table, id: &str) -> AppResult<()>;

    /// Delete every row matching all filters. Returns the number removed.
    async fn delete_where(&self, table: Table, filters: &[FilterField]) -> AppResult<u64>;
}
