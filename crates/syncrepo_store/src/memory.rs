//! In-memory local store for testing.

use crate::backend::{LocalStore, Record, StoreFactory, TableSchema};
use crate::catalog::Catalog;
use crate::error::StoreResult;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An in-memory local store.
///
/// This store keeps all tables in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// Cloning a `MemoryStore` yields another handle to the same tables, so a
/// test can keep a clone to inspect what a repository wrote.
///
/// # Example
///
/// ```rust
/// use syncrepo_store::{LocalStore, MemoryStore, TableSchema};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// store.create_table(TableSchema::auto("Customer", "id")).unwrap();
/// let stored = store.insert("Customer", json!({"id": 0, "name": "Acme"})).unwrap();
/// assert_eq!(stored["id"], 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    catalog: Arc<RwLock<Catalog>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the given tables already declared.
    #[must_use]
    pub fn with_tables(schemas: impl IntoIterator<Item = TableSchema>) -> Self {
        let store = Self::new();
        {
            let mut catalog = store.catalog.write();
            for schema in schemas {
                catalog.create_table(schema);
            }
        }
        store
    }
}

impl LocalStore for MemoryStore {
    fn create_table(&self, schema: TableSchema) -> StoreResult<()> {
        self.catalog.write().create_table(schema);
        Ok(())
    }

    fn tables(&self) -> StoreResult<Vec<String>> {
        Ok(self.catalog.read().table_names())
    }

    fn count(&self, table: &str) -> StoreResult<usize> {
        self.catalog.read().count(table)
    }

    fn scan_all(&self, table: &str) -> StoreResult<Vec<Record>> {
        self.catalog.read().scan_all(table)
    }

    fn find_by_field(&self, table: &str, field: &str, value: &Value) -> StoreResult<Vec<Record>> {
        self.catalog.read().find_by_field(table, field, value)
    }

    fn insert(&self, table: &str, record: Record) -> StoreResult<Record> {
        self.catalog.write().insert(table, record)
    }

    fn update(&self, table: &str, key: i64, record: Record) -> StoreResult<()> {
        self.catalog.write().update(table, key, record)
    }

    fn delete_by_key(&self, table: &str, key: i64) -> StoreResult<bool> {
        self.catalog.write().delete_by_key(table, key)
    }

    fn clear_table(&self, table: &str) -> StoreResult<()> {
        self.catalog.write().clear_table(table)
    }
}

/// Hands out one [`MemoryStore`] per database name.
///
/// Opening the same name twice returns handles to the same tables.
#[derive(Debug, Default)]
pub struct MemoryStoreFactory {
    databases: Mutex<HashMap<String, MemoryStore>>,
}

impl MemoryStoreFactory {
    /// Creates a factory with no databases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the database called `db_name` if it has been opened.
    pub fn database(&self, db_name: &str) -> Option<MemoryStore> {
        self.databases.lock().get(db_name).cloned()
    }

    /// Returns how many databases have been opened.
    pub fn open_count(&self) -> usize {
        self.databases.lock().len()
    }
}

impl StoreFactory for MemoryStoreFactory {
    type Store = MemoryStore;

    fn open(&self, db_name: &str) -> StoreResult<MemoryStore> {
        Ok(self
            .databases
            .lock()
            .entry(db_name.to_string())
            .or_default()
            .clone())
    }
}

/// An already-open store can stand in for its own factory.
impl StoreFactory for MemoryStore {
    type Store = MemoryStore;

    fn open(&self, _db_name: &str) -> StoreResult<MemoryStore> {
        Ok(self.clone())
    }
}
