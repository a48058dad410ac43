//! File-based local store for persistent storage.
//!
//! A database is a directory:
//!
//! ```text
//! <root>/<db_name>/
//! ├─ LOCK              # Advisory lock for single-writer
//! └─ tables.cbor       # Framed CBOR snapshot of every table
//! ```
//!
//! Every mutation writes a complete new snapshot to `tables.cbor.tmp`,
//! syncs it and renames it over `tables.cbor`, so a crash leaves either
//! the old or the new snapshot on disk.

use crate::backend::{LocalStore, Record, StoreFactory, TableSchema};
use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const SNAPSHOT_FILE: &str = "tables.cbor";
const SNAPSHOT_TEMP: &str = "tables.cbor.tmp";

/// Snapshot header: magic (4) + version (2) + payload length (4) + SHA-256 (32).
const MAGIC: &[u8; 4] = b"SRTB";
const FORMAT_VERSION: u16 = 1;
const HEADER_SIZE: usize = 4 + 2 + 4 + 32;

/// A file-backed local store.
///
/// Tables are held in memory and mirrored to a snapshot file after every
/// mutation. Data survives process restarts, including each table's key
/// generator, so keys are never reused across sessions.
///
/// # Thread Safety
///
/// The store holds an exclusive lock on its directory. Only one
/// `FileStore` can be open per directory at a time; within a process it
/// can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use syncrepo_store::{FileStore, LocalStore, TableSchema};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("data/app")).unwrap();
/// store.create_table(TableSchema::auto("Customer", "id")).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    catalog: RwLock<Catalog>,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a database directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - Another process holds the lock (returns `Locked`)
    /// - The snapshot exists but is corrupted
    pub fn open(path: &Path) -> StoreResult<Self> {
        fs::create_dir_all(path)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }

        let snapshot_path = path.join(SNAPSHOT_FILE);
        let catalog = if snapshot_path.exists() {
            decode_snapshot(&fs::read(&snapshot_path)?)?
        } else {
            Catalog::default()
        };

        tracing::debug!(path = %path.display(), "opened file store");

        Ok(Self {
            path: path.to_path_buf(),
            catalog: RwLock::new(catalog),
            _lock_file: lock_file,
        })
    }

    /// Returns the database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `f` to a copy of the catalog, persists the copy and only
    /// then makes it current. A failed write leaves the store unchanged.
    fn mutate<R>(&self, f: impl FnOnce(&mut Catalog) -> StoreResult<R>) -> StoreResult<R> {
        let mut catalog = self.catalog.write();
        let mut next = catalog.clone();
        let result = f(&mut next)?;
        self.persist(&next)?;
        *catalog = next;
        Ok(result)
    }

    fn persist(&self, catalog: &Catalog) -> StoreResult<()> {
        let bytes = encode_snapshot(catalog)?;
        let temp_path = self.path.join(SNAPSHOT_TEMP);

        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.path.join(SNAPSHOT_FILE))?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn create_table(&self, schema: TableSchema) -> StoreResult<()> {
        if self.catalog.read().has_table(&schema.name) {
            return Ok(());
        }
        self.mutate(|catalog| {
            catalog.create_table(schema);
            Ok(())
        })
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
        self.mutate(|catalog| catalog.insert(table, record))
    }

    fn update(&self, table: &str, key: i64, record: Record) -> StoreResult<()> {
        self.mutate(|catalog| catalog.update(table, key, record))
    }

    fn delete_by_key(&self, table: &str, key: i64) -> StoreResult<bool> {
        self.mutate(|catalog| catalog.delete_by_key(table, key))
    }

    fn clear_table(&self, table: &str) -> StoreResult<()> {
        self.mutate(|catalog| catalog.clear_table(table))
    }
}

/// Opens [`FileStore`] databases as subdirectories of a root directory.
#[derive(Debug, Clone)]
pub struct FileStoreFactory {
    root: PathBuf,
}

impl FileStoreFactory {
    /// Creates a factory rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory a database of this name lives in.
    #[must_use]
    pub fn database_path(&self, db_name: &str) -> PathBuf {
        self.root.join(db_name)
    }
}

impl StoreFactory for FileStoreFactory {
    type Store = FileStore;

    fn open(&self, db_name: &str) -> StoreResult<FileStore> {
        FileStore::open(&self.database_path(db_name))
    }
}

fn encode_snapshot(catalog: &Catalog) -> StoreResult<Vec<u8>> {
    let mut payload = Vec::new();
    ciborium::into_writer(catalog, &mut payload)
        .map_err(|e| StoreError::Codec(format!("failed to encode tables: {}", e)))?;

    let len = u32::try_from(payload.len())
        .map_err(|_| StoreError::Codec("snapshot exceeds 4 GiB".into()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&len.to_le_bytes());
    bytes.extend_from_slice(&Sha256::digest(&payload));
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode_snapshot(bytes: &[u8]) -> StoreResult<Catalog> {
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Corrupted("snapshot shorter than header".into()));
    }
    if &bytes[0..4] != MAGIC {
        return Err(StoreError::Corrupted("bad snapshot magic".into()));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(StoreError::Corrupted(format!(
            "unsupported snapshot version {}",
            version
        )));
    }

    let len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != len {
        return Err(StoreError::Corrupted(format!(
            "snapshot payload is {} bytes, header says {}",
            payload.len(),
            len
        )));
    }
    if Sha256::digest(payload).as_slice() != &bytes[10..HEADER_SIZE] {
        return Err(StoreError::Corrupted("snapshot checksum mismatch".into()));
    }

    ciborium::from_reader(payload)
        .map_err(|e| StoreError::Codec(format!("failed to decode tables: {}", e)))
}
