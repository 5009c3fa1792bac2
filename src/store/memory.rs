//! # In-Memory Store
//!
//! An in-memory `StoreClient` for testing. It understands just enough of
//! the engine's four query shapes to answer them from a flat row set:
//! count queries report the row count, existence checks report presence,
//! latest-date lookups serve a configured date, and everything else is
//! treated as a data fetch and paged.
//!
//! In production the client is backed by the remote document store.

use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::query::QueryParameter;

use super::client::{PageCursor, PageMetadata, QueryPage, StoreClient, StoreQuery};
use super::errors::{StoreError, StoreResult};
use super::scope::ExecutionScope;

const CONTENT_PATH: &str = "dbs/data/colls/records";

/// One recorded `execute` call, for test assertions.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub text: String,
    pub parameters: Vec<QueryParameter>,
    pub scope: ExecutionScope,
    pub max_item_count: usize,
    pub continuation: Option<String>,
}

/// In-memory document store for tests.
#[derive(Default)]
pub struct InMemoryStore {
    rows: RwLock<Vec<Value>>,
    latest_date: RwLock<Option<String>>,
    executions: Mutex<Vec<ExecutionRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Value>) -> Self {
        let store = Self::new();
        store.set_rows(rows);
        store
    }

    pub fn set_rows(&self, rows: Vec<Value>) {
        if let Ok(mut guard) = self.rows.write() {
            *guard = rows;
        }
    }

    /// Configure the date served by latest-date lookups.
    pub fn set_latest_date(&self, date: &str) {
        if let Ok(mut guard) = self.latest_date.write() {
            *guard = Some(date.to_string());
        }
    }

    /// Every `execute` call recorded so far.
    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.executions
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of executions whose query text starts with `prefix`.
    pub fn execution_count_matching(&self, prefix: &str) -> usize {
        self.executions()
            .iter()
            .filter(|record| record.text.starts_with(prefix))
            .count()
    }

    fn pages_for(&self, query: &StoreQuery) -> StoreResult<Vec<Vec<Value>>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Query("lock poisoned".to_string()))?;

        let pages = if query.text.starts_with("SELECT VALUE COUNT") {
            vec![vec![json!(rows.len())]]
        } else if query.text.starts_with("SELECT TOP 1 VALUE (1)") {
            if rows.is_empty() {
                vec![Vec::new()]
            } else {
                vec![vec![json!(1)]]
            }
        } else if query.text.starts_with("SELECT TOP 1 c.date") {
            let latest = self
                .latest_date
                .read()
                .map_err(|_| StoreError::Query("lock poisoned".to_string()))?;
            match latest.as_deref() {
                Some(date) => vec![vec![json!({ "date": date })]],
                None => vec![Vec::new()],
            }
        } else {
            // Data fetch: page the row set. An empty set still yields one
            // empty page, matching the remote store's cursor behavior.
            if rows.is_empty() {
                vec![Vec::new()]
            } else {
                rows.chunks(query.max_item_count.max(1))
                    .map(|chunk| chunk.to_vec())
                    .collect()
            }
        };

        Ok(pages)
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn execute(&self, query: StoreQuery) -> StoreResult<Box<dyn PageCursor>> {
        let pages = self.pages_for(&query)?;

        self.executions
            .lock()
            .map_err(|_| StoreError::Query("lock poisoned".to_string()))?
            .push(ExecutionRecord {
                text: query.text.clone(),
                parameters: query.parameters.clone(),
                scope: query.scope.clone(),
                max_item_count: query.max_item_count,
                continuation: query.continuation.as_ref().map(|t| t.as_str().to_string()),
            });

        Ok(Box::new(MemoryCursor { pages, next: 0 }))
    }
}

/// Cursor over pre-chunked pages.
struct MemoryCursor {
    pages: Vec<Vec<Value>>,
    next: usize,
}

#[async_trait]
impl PageCursor for MemoryCursor {
    async fn next_page(&mut self) -> StoreResult<Option<QueryPage>> {
        let Some(items) = self.pages.get(self.next).cloned() else {
            return Ok(None);
        };
        self.next += 1;

        let metadata = PageMetadata {
            request_charge: 1.0 + items.len() as f64 * 0.05,
            item_count: items.len(),
            content_path: Some(CONTENT_PATH.to_string()),
        };

        Ok(Some(QueryPage { items, metadata }))
    }
}
