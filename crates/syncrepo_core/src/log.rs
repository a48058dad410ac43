//! Transaction log persisted in a local table.

use crate::entity::Entity;
use crate::error::{RepositoryError, RepositoryResult};
use crate::transaction::LocalTransaction;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use syncrepo_store::{LocalStore, StoreError, TableSchema};

/// Primary-key field of every log table.
pub const LOG_KEY_FIELD: &str = "seq";

/// Schema for a log table called `table`.
pub fn log_table_schema(table: impl Into<String>) -> TableSchema {
    TableSchema::auto(table, LOG_KEY_FIELD)
}

/// A log row: the transaction and its position in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry<T> {
    /// Position in the log. Later entries have larger values.
    pub seq: i64,
    /// The recorded mutation.
    pub transaction: LocalTransaction<T>,
}

/// An ordered, append-only record of offline mutations for one entity type.
///
/// The log lives in its own auto-increment table, so row order is append
/// order is replay order.
///
/// # Invariants
///
/// - Entries are returned in append order
/// - Appending never reorders or rewrites existing entries
/// - Only replay removes entries, on acknowledgement or by clearing
pub struct TransactionLog<T, S> {
    store: Arc<S>,
    table: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity, S: LocalStore> TransactionLog<T, S> {
    /// Opens the log stored in `table`. The table must already exist.
    pub fn new(store: Arc<S>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the log's table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Appends a transaction and returns its sequence number.
    pub fn append(&self, transaction: &LocalTransaction<T>) -> RepositoryResult<i64> {
        let mut record = serde_json::to_value(transaction)?;
        if let Some(object) = record.as_object_mut() {
            object.insert(LOG_KEY_FIELD.to_string(), Value::from(0));
        }

        let stored = self.store.insert(&self.table, record)?;
        let seq = seq_of(&self.table, &stored)?;

        tracing::debug!(
            table = %self.table,
            seq,
            action = %transaction.action,
            "appended local transaction"
        );
        Ok(seq)
    }

    /// Returns every entry in append order.
    pub fn entries(&self) -> RepositoryResult<Vec<LogEntry<T>>> {
        self.store
            .scan_all(&self.table)?
            .into_iter()
            .map(|record| {
                let seq = seq_of(&self.table, &record)?;
                let transaction = serde_json::from_value(record)?;
                Ok(LogEntry { seq, transaction })
            })
            .collect()
    }

    /// Returns the number of pending entries.
    pub fn len(&self) -> RepositoryResult<usize> {
        Ok(self.store.count(&self.table)?)
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> RepositoryResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Persists a changed entry in place.
    pub fn rewrite(&self, entry: &LogEntry<T>) -> RepositoryResult<()> {
        let record = serde_json::to_value(&entry.transaction)?;
        self.store.update(&self.table, entry.seq, record)?;
        Ok(())
    }

    /// Removes an entry that has been replayed.
    pub fn acknowledge(&self, seq: i64) -> RepositoryResult<()> {
        self.store.delete_by_key(&self.table, seq)?;
        Ok(())
    }

    /// Removes every entry.
    pub fn clear(&self) -> RepositoryResult<()> {
        self.store.clear_table(&self.table)?;
        Ok(())
    }
}

fn seq_of(table: &str, record: &Value) -> RepositoryResult<i64> {
    record
        .get(LOG_KEY_FIELD)
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            RepositoryError::Store(StoreError::InvalidKey {
                table: table.to_string(),
                message: format!("log row without {}", LOG_KEY_FIELD),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_entity::Account;
    use crate::transaction::ActionKind;
    use syncrepo_store::MemoryStore;

    fn log() -> TransactionLog<Account, MemoryStore> {
        let store = MemoryStore::with_tables([log_table_schema("Account_LocalTransactions")]);
        TransactionLog::new(Arc::new(store), "Account_LocalTransactions")
    }

    #[test]
    fn append_assigns_increasing_seq() {
        let log = log();

        let first = log
            .append(&LocalTransaction::insert(Account::new(1, "a", 0)))
            .unwrap();
        let second = log.append(&LocalTransaction::delete_all()).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(log.len().unwrap(), 2);
    }

    #[test]
    fn entries_in_append_order() {
        let log = log();
        log.append(&LocalTransaction::insert(Account::new(1, "a", 0)))
            .unwrap();
        log.append(&LocalTransaction::update_by_id(Account::new(1, "b", 0)))
            .unwrap();
        log.append(&LocalTransaction::delete_by_id(1, None)).unwrap();

        let actions: Vec<_> = log
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.transaction.action)
            .collect();
        assert_eq!(
            actions,
            [ActionKind::Insert, ActionKind::UpdateById, ActionKind::DeleteById]
        );
    }

    #[test]
    fn rewrite_keeps_position() {
        let log = log();
        log.append(&LocalTransaction::insert(Account::new(1, "a", 0)))
            .unwrap();
        log.append(&LocalTransaction::update_by_id(Account::new(1, "b", 0)))
            .unwrap();

        let mut entry = log.entries().unwrap().remove(1);
        entry.transaction.remap_key(1, 57);
        log.rewrite(&entry).unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries[1].seq, entry.seq);
        assert_eq!(entries[1].transaction.target_key(), Some(57));
        assert!(entries[1].transaction.reconciled);
    }

    #[test]
    fn acknowledge_and_clear() {
        let log = log();
        let seq = log.append(&LocalTransaction::delete_all()).unwrap();
        log.append(&LocalTransaction::delete_all()).unwrap();

        log.acknowledge(seq).unwrap();
        assert_eq!(log.len().unwrap(), 1);

        log.clear().unwrap();
        assert!(log.is_empty().unwrap());

        // Sequence numbers keep increasing after a clear
        assert_eq!(log.append(&LocalTransaction::delete_all()).unwrap(), 3);
    }

    #[test]
    fn missing_table_is_an_error() {
        let log: TransactionLog<Account, MemoryStore> =
            TransactionLog::new(Arc::new(MemoryStore::new()), "Nope");
        assert!(matches!(
            log.append(&LocalTransaction::delete_all()),
            Err(RepositoryError::Store(StoreError::UnknownTable(_)))
        ));
    }
}
