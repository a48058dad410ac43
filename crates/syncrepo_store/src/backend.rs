//! Local store driver trait definition.

use crate::error::StoreResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored row. Always a JSON object once accepted by a store.
pub type Record = Value;

/// Declares one table of a local database.
///
/// Mirrors the schema declarations a host registers with its embedded
/// store: a table name, the field holding the primary key, and whether
/// the store generates keys for rows that arrive without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Name of the primary-key field inside each record.
    pub primary_key: String,
    /// Whether the store assigns keys to rows with a missing, null or zero key.
    pub auto_increment: bool,
}

impl TableSchema {
    /// Creates a schema for a table with store-assigned integer keys.
    pub fn auto(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            auto_increment: true,
        }
    }

    /// Creates a schema for a table whose keys are supplied by the caller.
    pub fn manual(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            auto_increment: false,
        }
    }
}

/// An embedded key-indexed table store.
///
/// Tables hold JSON object records indexed by an integer primary key
/// stored in the field named by the table's [`TableSchema`].
///
/// # Invariants
///
/// - `scan_all` returns rows in ascending key order; for an auto-increment
///   table that is insertion order
/// - `insert` returns the record exactly as stored, including an assigned key
/// - generated keys are never reused within a table, even after deletes
/// - Stores must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For tests and ephemeral databases
/// - [`super::FileStore`] - For persistent storage
pub trait LocalStore: Send + Sync {
    /// Creates a table if it does not already exist.
    ///
    /// Creating an existing table is a no-op; its rows are kept.
    fn create_table(&self, schema: TableSchema) -> StoreResult<()>;

    /// Returns the names of all tables.
    fn tables(&self) -> StoreResult<Vec<String>>;

    /// Returns the number of rows in a table.
    fn count(&self, table: &str) -> StoreResult<usize>;

    /// Returns every row of a table in ascending key order.
    fn scan_all(&self, table: &str) -> StoreResult<Vec<Record>>;

    /// Returns the rows whose `field` equals `value`.
    fn find_by_field(&self, table: &str, field: &str, value: &Value) -> StoreResult<Vec<Record>>;

    /// Inserts a new row and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The table does not exist
    /// - The record is not an object or carries a non-integer key
    /// - A row with the same key exists
    fn insert(&self, table: &str, record: Record) -> StoreResult<Record>;

    /// Writes `record` under `key`, replacing any existing row.
    ///
    /// The record's primary-key field is set to `key`.
    fn update(&self, table: &str, key: i64, record: Record) -> StoreResult<()>;

    /// Removes the row with `key`. Returns whether a row existed.
    fn delete_by_key(&self, table: &str, key: i64) -> StoreResult<bool>;

    /// Removes every row of a table.
    fn clear_table(&self, table: &str) -> StoreResult<()>;
}

/// Opens local databases by name.
///
/// Repositories hold a factory rather than an open store so that the
/// database is only opened on first use.
pub trait StoreFactory: Send + Sync {
    /// The store type this factory opens.
    type Store: LocalStore + 'static;

    /// Opens (or creates) the database called `db_name`.
    fn open(&self, db_name: &str) -> StoreResult<Self::Store>;
}
