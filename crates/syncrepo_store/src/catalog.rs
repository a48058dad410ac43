//! In-memory table catalog shared by the store implementations.

use crate::backend::{Record, TableSchema};
use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single table: its schema, its key generator and its rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Table {
    pub(crate) schema: TableSchema,
    /// Next key handed out by auto-increment.
    pub(crate) next_key: i64,
    pub(crate) rows: BTreeMap<i64, Record>,
}

impl Table {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            next_key: 1,
            rows: BTreeMap::new(),
        }
    }

    /// Reads the primary key from a record. `Ok(None)` when absent or null.
    fn key_of(&self, record: &Record) -> StoreResult<Option<i64>> {
        let object = record.as_object().ok_or_else(|| StoreError::InvalidRecord {
            table: self.schema.name.clone(),
        })?;

        match object.get(&self.schema.primary_key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                StoreError::invalid_key(
                    &self.schema.name,
                    format!("field {} is not an integer: {}", self.schema.primary_key, value),
                )
            }),
        }
    }

    fn set_key(&self, record: &mut Record, key: i64) {
        if let Some(object) = record.as_object_mut() {
            object.insert(self.schema.primary_key.clone(), Value::from(key));
        }
    }

    fn observe_key(&mut self, key: i64) {
        if key >= self.next_key {
            self.next_key = key.saturating_add(1);
        }
    }

    fn insert(&mut self, mut record: Record) -> StoreResult<Record> {
        let key = match self.key_of(&record)? {
            Some(key) if key != 0 || !self.schema.auto_increment => key,
            _ if self.schema.auto_increment => {
                let key = self.next_key;
                self.set_key(&mut record, key);
                key
            }
            _ => {
                return Err(StoreError::invalid_key(
                    &self.schema.name,
                    format!("record has no {} field", self.schema.primary_key),
                ))
            }
        };

        if self.rows.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                table: self.schema.name.clone(),
                key,
            });
        }

        self.observe_key(key);
        self.rows.insert(key, record.clone());
        Ok(record)
    }

    fn update(&mut self, key: i64, mut record: Record) -> StoreResult<()> {
        if !record.is_object() {
            return Err(StoreError::InvalidRecord {
                table: self.schema.name.clone(),
            });
        }
        self.set_key(&mut record, key);
        self.observe_key(key);
        self.rows.insert(key, record);
        Ok(())
    }
}

/// All tables of one database, ordered by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Catalog {
    tables: BTreeMap<String, Table>,
}

impl Catalog {
    fn table(&self, name: &str) -> StoreResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> StoreResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    pub(crate) fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub(crate) fn create_table(&mut self, schema: TableSchema) {
        self.tables
            .entry(schema.name.clone())
            .or_insert_with(|| Table::new(schema));
    }

    pub(crate) fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub(crate) fn count(&self, table: &str) -> StoreResult<usize> {
        Ok(self.table(table)?.rows.len())
    }

    pub(crate) fn scan_all(&self, table: &str) -> StoreResult<Vec<Record>> {
        Ok(self.table(table)?.rows.values().cloned().collect())
    }

    pub(crate) fn find_by_field(
        &self,
        table: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Record>> {
        Ok(self
            .table(table)?
            .rows
            .values()
            .filter(|record| record.get(field) == Some(value))
            .cloned()
            .collect())
    }

    pub(crate) fn insert(&mut self, table: &str, record: Record) -> StoreResult<Record> {
        self.table_mut(table)?.insert(record)
    }

    pub(crate) fn update(&mut self, table: &str, key: i64, record: Record) -> StoreResult<()> {
        self.table_mut(table)?.update(key, record)
    }

    pub(crate) fn delete_by_key(&mut self, table: &str, key: i64) -> StoreResult<bool> {
        Ok(self.table_mut(table)?.rows.remove(&key).is_some())
    }

    pub(crate) fn clear_table(&mut self, table: &str) -> StoreResult<()> {
        self.table_mut(table)?.rows.clear();
        Ok(())
    }
}
