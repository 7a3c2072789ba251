/// In-memory table store
///
/// Keeps each table as an ordered list of JSON rows and evaluates the same
/// filters the REST backend sends to the hosted store. Rows without an `id`
/// get a per-table increasing integer id on insert.

use crate::error::StoreError;
use crate::store::{Filter, FilterOp, Query, Returning, TableStore};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Map<String, Value>>,
    next_id: u64,
}

/// Process-local table store
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, Table>>,
    unavailable: AtomicBool,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `StoreError::Unavailable` (or recover)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Snapshot of all rows in `table`, in insertion order
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

/// Order two JSON values: numbers numerically, RFC 3339 strings by instant,
/// other strings lexically
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Interpret a textual filter value against the type of the stored column
fn coerce_like(stored: &Value, raw: &str) -> Value {
    match stored {
        Value::Number(_) => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Value::Bool(_) => raw
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

fn row_matches(row: &Map<String, Value>, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        let Some(stored) = row.get(&filter.column) else {
            return false;
        };
        let wanted = coerce_like(stored, &filter.value);
        match (filter.op, compare_values(stored, &wanted)) {
            (FilterOp::Eq, Some(ordering)) => ordering == Ordering::Equal,
            (FilterOp::Gte, Some(ordering)) => ordering != Ordering::Less,
            (FilterOp::Lt, Some(ordering)) => ordering == Ordering::Less,
            (_, None) => false,
        }
    })
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let Some(table) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Map<String, Value>> = table
            .rows
            .iter()
            .filter(|row| row_matches(row, &query.filters))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .cloned()
            .map(Value::Object)
            .collect())
    }

    async fn insert(
        &self,
        table: &str,
        row: Value,
        returning: Returning,
    ) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        let Value::Object(mut row) = row else {
            return Err(StoreError::Status {
                status: 400,
                body: "row must be a JSON object".to_string(),
            });
        };

        let mut tables = self.tables.write().await;
        let table = tables.entry(table.to_string()).or_default();
        table.next_id += 1;
        row.entry("id")
            .or_insert_with(|| Value::from(table.next_id));
        table.rows.push(row.clone());

        match returning {
            Returning::Representation => Ok(vec![Value::Object(row)]),
            Returning::Minimal => Ok(Vec::new()),
        }
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        let Value::Object(patch) = patch else {
            return Err(StoreError::Status {
                status: 400,
                body: "patch must be a JSON object".to_string(),
            });
        };

        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in table.rows.iter_mut().filter(|row| row_matches(row, filters)) {
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (removed, kept): (Vec<_>, Vec<_>) = table
            .rows
            .drain(..)
            .partition(|row| row_matches(row, filters));
        table.rows = kept;
        Ok(removed.into_iter().map(Value::Object).collect())
    }

    async fn probe(&self) -> Result<String, StoreError> {
        self.check_available()?;
        Ok("in-memory store".to_string())
    }
}
