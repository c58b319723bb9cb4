//! Filter types for entity store queries.
//!
//! Filters are expressed against the serialized (JSON) shape of a record,
//! so any store backend can evaluate them without knowing the entity type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sorting::SortField;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Case-insensitive substring match.
    ILike,
    /// Membership in a list of strings.
    In,
    /// The field is null or absent.
    IsNull,
    /// The field is present and not null.
    IsNotNull,
}

/// A dynamic filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// A list of string values (for `In`).
    StringList(Vec<String>),
    /// Null / no value (for `IsNull`, `IsNotNull`).
    Null,
}

/// A single filter condition on a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// The column or field name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: FilterValue,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Shorthand for an equality filter on a string-like value (ids included).
    pub fn eq(field: impl Into<String>, value: impl ToString) -> Self {
        Self::new(field, FilterOp::Eq, FilterValue::String(value.to_string()))
    }

    /// Shorthand for a case-insensitive substring filter.
    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOp::ILike, FilterValue::String(pattern.into()))
    }

    /// Shorthand for a list-membership filter.
    pub fn in_list<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self::new(
            field,
            FilterOp::In,
            FilterValue::StringList(values.into_iter().map(|v| v.to_string()).collect()),
        )
    }

    /// Shorthand for an `IS NULL` filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IsNull, FilterValue::Null)
    }

    /// Shorthand for an `IS NOT NULL` filter.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IsNotNull, FilterValue::Null)
    }

    /// Evaluate this condition against a serialized record.
    pub fn matches(&self, record: &serde_json::Map<String, Value>) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::IsNull => actual.is_null(),
            FilterOp::IsNotNull => !actual.is_null(),
            FilterOp::Eq => value_equals(actual, &self.value),
            FilterOp::Ne => !value_equals(actual, &self.value),
            FilterOp::ILike => match (actual, &self.value) {
                (Value::String(s), FilterValue::String(pattern)) => s
                    .to_lowercase()
                    .contains(&pattern.trim_matches('%').to_lowercase()),
                _ => false,
            },
            FilterOp::In => match (&self.value, actual) {
                (FilterValue::StringList(list), Value::String(s)) => list.iter().any(|v| v == s),
                _ => false,
            },
        }
    }
}

fn value_equals(actual: &Value, expected: &FilterValue) -> bool {
    match (actual, expected) {
        (Value::String(a), FilterValue::String(b)) => a == b,
        (Value::Number(a), FilterValue::Integer(b)) => a.as_i64() == Some(*b),
        (Value::Bool(a), FilterValue::Boolean(b)) => a == b,
        (Value::Null, FilterValue::Null) => true,
        _ => false,
    }
}

/// A list query: conjunctive filters plus an ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    /// All filters must match.
    #[serde(default)]
    pub filters: Vec<FilterField>,
    /// Sort keys, applied in order.
    #[serde(default)]
    pub order: Vec<SortField>,
}

impl ListQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter.
    pub fn filter(mut self, filter: FilterField) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a sort key.
    pub fn order_by(mut self, sort: SortField) -> Self {
        self.order.push(sort);
        self
    }

    /// Whether every filter matches the record.
    pub fn matches(&self, record: &serde_json::Map<String, Value>) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }
}
