//! CLI command implementations.

pub mod clear_log;
pub mod dump_log;
pub mod inspect;

use std::path::Path;
use syncrepo_store::{FileStore, FileStoreFactory};

/// Opens an existing database called `db` under `root`.
///
/// Unlike [`FileStore::open`] this never creates a database.
pub fn open_existing(root: &Path, db: &str) -> Result<FileStore, Box<dyn std::error::Error>> {
    let path = FileStoreFactory::new(root).database_path(db);
    if !path.is_dir() {
        return Err(format!("No database found at {:?}", path).into());
    }
    Ok(FileStore::open(&path)?)
}

/// Returns the log table name for `entity`.
pub fn log_table(entity: &str) -> String {
    format!("{}{}", entity, syncrepo_core::LOCAL_TRANSACTIONS_SUFFIX)
}
