//! The record store port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

pub type Fields = serde_json::Map<String, Value>;

/// A row with its store-assigned id and named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Row {
    /// Trimmed, non-empty text value of `name`.
    ///
    /// Lookup and rollup fields arrive as arrays; their first element is used.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        let value = match self.fields.get(name)? {
            Value::Array(items) => items.first()?,
            other => other,
        };
        value.as_str().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Non-negative integer value of `name`; numeric strings are accepted.
    #[must_use]
    pub fn count(&self, name: &str) -> Option<u64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Exact-match filter on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: String,
    pub value: String,
}

impl FieldMatch {
    /// Airtable formula for this match, with the value quoted and escaped.
    #[must_use]
    pub fn to_formula(&self) -> String {
        let escaped = self.value.replace('\\', "\\\\").replace('\'', "\\'");
        format!("{{{}}} = '{escaped}'", self.field)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: Option<FieldMatch>,
    pub view: Option<String>,
    pub max_records: Option<u32>,
}

impl Query {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            filter: Some(FieldMatch {
                field: field.into(),
                value: value.into(),
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, max_records: u32) -> Self {
        self.max_records = Some(max_records);
        self
    }
}

/// Tabular record store: filtered reads, batch creates, and field updates.
///
/// Implementations surface transport and permission failures as
/// [`StoreError`]; an empty result is not an error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Creates one row per entry in `rows` and returns the created rows.
    async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Row>, StoreError>;

    /// Overwrites the given fields on row `id`, leaving other fields alone.
    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<(), StoreError>;
}
