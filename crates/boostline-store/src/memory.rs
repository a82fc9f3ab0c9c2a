//! In-process [`RecordStore`] for tests and dry runs.
//!
//! Filters match exact string (or numeric) equality. Views are not modelled:
//! a query naming a view sees every row of the table.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{Fields, Query, RecordStore, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Create,
    Update,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    next_id: u64,
    queries: Vec<(String, Query)>,
    injected_failures: HashMap<(String, Operation), u32>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row and returns its id.
    pub fn insert(&self, table: &str, fields: Fields) -> String {
        let mut state = self.lock();
        let id = next_id(&mut state);
        state
            .tables
            .entry(table.to_owned())
            .or_default()
            .push(Row {
                id: id.clone(),
                fields,
            });
        id
    }

    /// Seeds a row from a `json!({...})` object literal.
    pub fn insert_json(&self, table: &str, fields: &Value) -> String {
        self.insert(table, fields.as_object().cloned().unwrap_or_default())
    }

    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn row(&self, table: &str, id: &str) -> Option<Row> {
        self.rows(table).into_iter().find(|r| r.id == id)
    }

    /// Every select issued so far, in order, with the table it targeted.
    #[must_use]
    pub fn query_log(&self) -> Vec<(String, Query)> {
        self.lock().queries.clone()
    }

    /// Makes the next `times` calls of `operation` on `table` fail with a 503.
    pub fn fail_next(&self, table: &str, operation: Operation, times: u32) {
        self.lock()
            .injected_failures
            .insert((table.to_owned(), operation), times);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(state: &mut State, table: &str, operation: Operation) -> Result<(), StoreError> {
        if let Some(remaining) = state
            .injected_failures
            .get_mut(&(table.to_owned(), operation))
        {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::UnexpectedStatus {
                    status: 503,
                    body: format!("injected {operation:?} failure on {table}"),
                });
            }
        }
        Ok(())
    }
}

fn next_id(state: &mut State) -> String {
    state.next_id += 1;
    format!("rec{:05}", state.next_id)
}

fn matches(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Array(items)) => items.iter().any(|v| matches(Some(v), expected)),
        _ => false,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let mut state = self.lock();
        state.queries.push((table.to_owned(), query.clone()));
        Self::take_failure(&mut state, table, Operation::Select)?;

        let rows = state.tables.get(table).cloned().unwrap_or_default();
        let limit = query.max_records.map_or(usize::MAX, |m| m as usize);
        Ok(rows
            .into_iter()
            .filter(|row| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|f| matches(row.fields.get(&f.field), &f.value))
            })
            .take(limit)
            .collect())
    }

    async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Row>, StoreError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, table, Operation::Create)?;

        let mut created = Vec::with_capacity(rows.len());
        for fields in rows {
            let row = Row {
                id: next_id(&mut state),
                fields,
            };
            created.push(row.clone());
            state.tables.entry(table.to_owned()).or_default().push(row);
        }
        Ok(created)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, table, Operation::Update)?;

        let row = state
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::UnexpectedStatus {
                status: 404,
                body: format!("record {id} not found in {table}"),
            })?;
        row.fields.extend(fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn select_filters_by_exact_match() {
        let store = MemoryStore::new();
        store.insert_json("Campaigns", &json!({ "Code": "ABC" }));
        store.insert_json("Campaigns", &json!({ "Code": "abc" }));

        let rows = store
            .select("Campaigns", &Query::field_equals("Code", "ABC"))
            .await
            .expect("select");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next("T", Operation::Create, 1);

        assert!(store.create("T", vec![Fields::new()]).await.is_err());
        let created = store.create("T", vec![Fields::new()]).await.expect("second create");
        assert_eq!(created.len(), 1);
        assert_eq!(store.rows("T").len(), 1);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        let id = store.insert_json("T", &json!({ "a": 1, "b": 2 }));
        let mut patch = Fields::new();
        patch.insert("b".to_owned(), json!(3));
        store.update("T", &id, patch).await.expect("update");

        let row = store.row("T", &id).expect("row");
        assert_eq!(row.fields["a"], json!(1));
        assert_eq!(row.fields["b"], json!(3));
    }

    #[tokio::test]
    async fn update_of_unknown_row_fails() {
        let store = MemoryStore::new();
        let err = store.update("T", "nope", Fields::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnexpectedStatus { status: 404, .. }));
    }
}
