//! Extension row storage.
//!
//! The registry reads one row per component from the extension table,
//! matched on `type = "component"` and `element = <option>`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of the extension table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRow {
    pub id: i64,
    pub option: String,
    /// JSON object blob.
    #[serde(default)]
    pub params: String,
    pub enabled: bool,
}

impl ExtensionRow {
    pub fn new(id: i64, option: impl Into<String>, enabled: bool) -> Self {
        Self {
            id,
            option: option.into(),
            params: String::new(),
            enabled,
        }
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }
}

/// Errors from an [`ExtensionStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No connection to the backing database. Lookups degrade to defaults.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The query itself failed.
    #[error("query failed: {0}")]
    Query(String),
}

/// Source of extension rows.
pub trait ExtensionStore: Send + Sync {
    /// Fetches the component row for `option`.
    fn find_component(&self, option: &str) -> Result<Option<ExtensionRow>, StoreError>;
}

/// Store used when no database is configured; every lookup reports a lost
/// connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDatabase;

impl ExtensionStore for NoDatabase {
    fn find_component(&self, _option: &str) -> Result<Option<ExtensionRow>, StoreError> {
        Err(StoreError::ConnectionFailed("no database configured".to_string()))
    }
}

/// In-memory extension table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, ExtensionRow>>,
    failure: RwLock<Option<StoreError>>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = ExtensionRow>) -> Self {
        let store = Self::new();
        for row in rows {
            store.insert(row);
        }
        store
    }

    pub fn insert(&self, row: ExtensionRow) {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        rows.insert(row.option.clone(), row);
    }

    /// Makes every subsequent lookup fail with `error`; `None` restores it.
    pub fn fail_with(&self, error: Option<StoreError>) {
        *self.failure.write().unwrap_or_else(|e| e.into_inner()) = error;
    }

    /// Number of lookups served, failed ones included.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl ExtensionStore for MemoryStore {
    fn find_component(&self, option: &str) -> Result<Option<ExtensionRow>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.read().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(err);
        }
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        Ok(rows.get(option).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryStore::with_rows([ExtensionRow::new(7, "com_blog", true)]);
        assert_eq!(store.find_component("com_blog").unwrap().unwrap().id, 7);
        assert!(store.find_component("com_wiki").unwrap().is_none());
        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_memory_store_failure() {
        let store = MemoryStore::new();
        store.fail_with(Some(StoreError::Query("boom".into())));
        assert_eq!(
            store.find_component("com_blog"),
            Err(StoreError::Query("boom".into()))
        );
        store.fail_with(None);
        assert_eq!(store.find_component("com_blog"), Ok(None));
    }

    #[test]
    fn test_no_database() {
        assert!(matches!(
            NoDatabase.find_component("com_blog"),
            Err(StoreError::ConnectionFailed(_))
        ));
    }
}
