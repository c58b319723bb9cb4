//! Sorting types for list queries.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Apply this direction to an ascending ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// A sort specification consisting of a field name and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Column or field name to sort by.
    pub field: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create an ascending sort on the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Create a descending sort on the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Compare two serialized records on this field.
    ///
    /// Nulls sort after every non-null value regardless of direction.
    pub fn compare(
        &self,
        a: &serde_json::Map<String, Value>,
        b: &serde_json::Map<String, Value>,
    ) -> Ordering {
        let left = a.get(&self.field).unwrap_or(&Value::Null);
        let right = b.get(&self.field).unwrap_or(&Value::Null);
        match (left, right) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::String(x), Value::String(y)) => self.direction.apply(x.cmp(y)),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or_default();
                let y = y.as_f64().unwrap_or_default();
                self.direction
                    .apply(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
            }
            (Value::Bool(x), Value::Bool(y)) => self.direction.apply(x.cmp(y)),
            _ => Ordering::Equal,
        }
    }
}
