//! Typed repositories over the entity store.

pub mod category;
pub mod material;
pub mod tag;

pub use category::CategoryRepository;
pub use material::MaterialRepository;
pub use tag::TagRepository;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_core::traits::store::Row;

/// Serialize a value into a store row.
pub(crate) fn to_row<T: Serialize>(value: &T) -> AppResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(AppError::new(
            ErrorKind::Serialization,
            format!("Expected an object row, got {other}"),
        )),
    }
}

/// Deserialize a store row into an entity.
pub(crate) fn from_row<T: DeserializeOwned>(row: Row) -> AppResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        AppError::with_source(ErrorKind::Serialization, "Failed to decode store row", e)
    })
}

/// Deserialize a list of rows.
pub(crate) fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> AppResult<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}
