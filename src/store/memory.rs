use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{OrderBy, RecordStore, Row, StoreBackend, StoreError, Table};

const ID_COLUMN: &str = "id";

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<Table, Vec<Row>>,
    next_id: i64,
}

/// In-memory record store holding rows exactly as they were written.
///
/// Nothing is type-checked on the way in, so tests can seed it with the
/// kind of malformed rows a loosely-typed hosted table may return.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held in `table`.
    pub fn row_count(&self, table: Table) -> usize {
        self.tables
            .lock()
            .map(|t| t.rows.get(&table).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, StoreError> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

impl Tables {
    fn push(&mut self, table: Table, mut row: Row) {
        self.next_id += 1;
        row.insert(ID_COLUMN.to_string(), Value::from(self.next_id));
        self.rows.entry(table).or_default().push(row);
    }
}

/// Total order over JSON values: null, booleans, numbers, then text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        self.with_tables(|tables| tables.push(table, row))
    }

    async fn select_all(&self, table: Table, order_by: OrderBy) -> Result<Vec<Row>, StoreError> {
        let mut rows = self.with_tables(|tables| {
            tables.rows.get(&table).cloned().unwrap_or_default()
        })?;

        // Stable sort: ties keep insertion order
        rows.sort_by(|a, b| {
            let ordering = compare_values(a.get(order_by.field), b.get(order_by.field));
            if order_by.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        Ok(rows)
    }

    async fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<(), StoreError> {
        let key = match row.get(conflict_key) {
            Some(value) if !value.is_null() => value.clone(),
            _ => {
                return Err(StoreError::InvalidRow {
                    table,
                    reason: format!("conflict column `{}` is missing", conflict_key),
                })
            }
        };

        self.with_tables(|tables| {
            let existing = tables
                .rows
                .get_mut(&table)
                .and_then(|rows| rows.iter_mut().find(|r| r.get(conflict_key) == Some(&key)));

            match existing {
                Some(stored) => {
                    for (column, value) in row {
                        stored.insert(column, value);
                    }
                }
                None => tables.push(table, row),
            }
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_tables(|_| ())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}
