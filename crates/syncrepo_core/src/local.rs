//! Offline repository: local table plus transaction log.

use crate::config::RepositoryConfig;
use crate::entity::{from_record, to_record, Entity, UNASSIGNED_KEY};
use crate::error::RepositoryResult;
use crate::log::{log_table_schema, TransactionLog};
use crate::repository::Repository;
use crate::transaction::LocalTransaction;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use syncrepo_store::{LocalStore, TableSchema};

/// Serves the repository contract from the local store and records
/// every successful mutation in the transaction log.
///
/// Local-store failures on the mutating paths are logged and reported as
/// `None`/`false`. A failed log append is logged and does not change the
/// mutation's result.
pub struct LocalRepository<T, S> {
    store: Arc<S>,
    table: String,
    log: TransactionLog<T, S>,
    auto_generate_key: bool,
}

impl<T: Entity, S: LocalStore> LocalRepository<T, S> {
    /// Opens the entity table and its log table in `store`, creating them
    /// if needed.
    pub fn open(store: Arc<S>, config: &RepositoryConfig) -> RepositoryResult<Self> {
        let table = config.entity_table::<T>();
        let log_table = config.log_table::<T>();

        let schema = if config.auto_generate_key {
            TableSchema::auto(table.as_str(), T::KEY_FIELD)
        } else {
            TableSchema::manual(table.as_str(), T::KEY_FIELD)
        };
        store.create_table(schema)?;
        store.create_table(log_table_schema(log_table.as_str()))?;

        Ok(Self {
            log: TransactionLog::new(Arc::clone(&store), log_table),
            store,
            table,
            auto_generate_key: config.auto_generate_key,
        })
    }

    /// Returns the entity table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the transaction log.
    pub fn log(&self) -> &TransactionLog<T, S> {
        &self.log
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn find(&self, key: i64) -> RepositoryResult<Option<T>> {
        let found = self
            .store
            .find_by_field(&self.table, T::KEY_FIELD, &Value::from(key))?;
        found.into_iter().next().map(from_record).transpose()
    }

    fn record(&self, transaction: LocalTransaction<T>) {
        if let Err(e) = self.log.append(&transaction) {
            tracing::warn!(
                table = %self.log.table(),
                action = %transaction.action,
                error = %e,
                "failed to record local transaction"
            );
        }
    }

    fn insert_local(&self, mut entity: T) -> RepositoryResult<T> {
        if self.auto_generate_key {
            entity.set_key(UNASSIGNED_KEY);
        }
        let stored = self.store.insert(&self.table, to_record(&entity)?)?;
        from_record(stored)
    }

    fn update_local(&self, entity: &T) -> RepositoryResult<()> {
        self.store
            .update(&self.table, entity.key(), to_record(entity)?)?;
        Ok(())
    }
}

#[async_trait]
impl<T: Entity, S: LocalStore> Repository<T> for LocalRepository<T, S> {
    async fn get_all(&self) -> RepositoryResult<Vec<T>> {
        self.store
            .scan_all(&self.table)?
            .into_iter()
            .map(from_record)
            .collect()
    }

    async fn get_by_id(&self, key: i64) -> RepositoryResult<Option<T>> {
        self.find(key)
    }

    async fn insert(&self, entity: T) -> RepositoryResult<Option<T>> {
        match self.insert_local(entity) {
            Ok(stored) => {
                tracing::debug!(table = %self.table, key = stored.key(), "inserted offline");
                self.record(LocalTransaction::insert(stored.clone()));
                Ok(Some(stored))
            }
            Err(e) => {
                tracing::warn!(table = %self.table, error = %e, "offline insert failed");
                Ok(None)
            }
        }
    }

    async fn update(&self, entity: T) -> RepositoryResult<Option<T>> {
        match self.update_local(&entity) {
            Ok(()) => {
                tracing::debug!(table = %self.table, key = entity.key(), "updated offline");
                self.record(LocalTransaction::update_by_id(entity.clone()));
                Ok(Some(entity))
            }
            Err(e) => {
                tracing::warn!(table = %self.table, key = entity.key(), error = %e, "offline update failed");
                Ok(None)
            }
        }
    }

    async fn delete_by_id(&self, key: i64) -> RepositoryResult<bool> {
        // The snapshot is informational; the delete goes ahead without it
        let snapshot = self.find(key).unwrap_or_else(|e| {
            tracing::debug!(table = %self.table, key, error = %e, "no snapshot for delete");
            None
        });

        match self.store.delete_by_key(&self.table, key) {
            Ok(existed) => {
                tracing::debug!(table = %self.table, key, existed, "deleted offline");
                self.record(LocalTransaction::delete_by_id(key, snapshot));
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(table = %self.table, key, error = %e, "offline delete failed");
                Ok(false)
            }
        }
    }

    async fn delete_by_entity(&self, entity: &T) -> RepositoryResult<bool> {
        self.delete_by_id(entity.key()).await
    }

    async fn delete_all(&self) -> RepositoryResult<bool> {
        match self.store.clear_table(&self.table) {
            Ok(()) => {
                tracing::debug!(table = %self.table, "cleared offline");
                self.record(LocalTransaction::delete_all());
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(table = %self.table, error = %e, "offline delete all failed");
                Ok(false)
            }
        }
    }
}
