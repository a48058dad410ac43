//! Clear log command implementation.
//!
//! Drops every pending entry for one entity type. Use this when an entry
//! fails permanently and blocks replay; the dropped mutations are lost.

use std::path::Path;
use syncrepo_store::LocalStore;

/// Runs the clear-log command.
pub fn run(root: &Path, db: &str, entity: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(root, db)?;
    let table = super::log_table(entity);
    let dropped = clear(&store, &table)?;

    tracing::info!(table = %table, dropped, "cleared transaction log");
    println!("Dropped {} pending entries from {}", dropped, table);
    Ok(())
}

/// Clears the log `table` and returns how many entries it held.
pub fn clear(store: &dyn LocalStore, table: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let dropped = store.count(table)?;
    store.clear_table(table)?;
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use syncrepo_core::log_table_schema;
    use syncrepo_store::{FileStore, TableSchema};
    use tempfile::tempdir;

    #[test]
    fn clears_only_the_log() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store
            .create_table(TableSchema::auto("Customer", "Id"))
            .unwrap();
        store
            .create_table(log_table_schema("Customer_LocalTransactions"))
            .unwrap();
        store
            .insert("Customer", json!({"Id": 0, "Name": "Acme"}))
            .unwrap();
        store
            .insert(
                "Customer_LocalTransactions",
                json!({"seq": 0, "action": "DeleteAll", "action_name": "DeleteAll"}),
            )
            .unwrap();

        let dropped = clear(&store, "Customer_LocalTransactions").unwrap();

        assert_eq!(dropped, 1);
        assert_eq!(store.count("Customer_LocalTransactions").unwrap(), 0);
        assert_eq!(store.count("Customer").unwrap(), 1);
    }
}
