//! Test fixtures and repository helpers.
//!
//! Provides a sample entity and convenience constructors for repositories
//! over in-memory and file-backed local stores.

use serde::{Deserialize, Serialize};
use syncrepo_core::{Entity, MemoryRemote, RepositoryConfig, SyncRepository, UNASSIGNED_KEY};
use syncrepo_store::{FileStoreFactory, MemoryStoreFactory};
use tempfile::TempDir;

/// Database name used by the fixtures.
pub const TEST_DB: &str = "RepositoryDemo";

/// A customer record, serialized with PascalCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// City, if known.
    #[serde(default)]
    pub city: Option<String>,
    /// Number of orders placed.
    #[serde(default)]
    pub orders: u32,
}

impl Customer {
    /// Creates a customer without a key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_KEY,
            name: name.into(),
            city: None,
            orders: 0,
        }
    }

    /// Sets the key.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Sets the city.
    pub fn in_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Sets the order count.
    pub fn with_orders(mut self, orders: u32) -> Self {
        self.orders = orders;
        self
    }
}

impl Entity for Customer {
    const NAME: &'static str = "Customer";
    const KEY_FIELD: &'static str = "Id";

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }
}

/// A handful of unkeyed customers.
pub fn sample_customers() -> Vec<Customer> {
    vec![
        Customer::new("Acme").in_city("Oslo").with_orders(12),
        Customer::new("Globex").in_city("Bergen").with_orders(3),
        Customer::new("Initech").in_city("Oslo").with_orders(0),
        Customer::new("Umbrella").with_orders(7),
    ]
}

/// Repository over an in-memory remote and in-memory local store.
pub type MemorySyncRepository =
    SyncRepository<Customer, MemoryRemote<Customer>, MemoryStoreFactory>;

/// Repository over an in-memory remote and a file-backed local store.
pub type FileSyncRepository = SyncRepository<Customer, MemoryRemote<Customer>, FileStoreFactory>;

/// Creates an in-memory repository whose remote assigns keys from
/// `first_server_key`.
pub fn memory_repository(config: RepositoryConfig, first_server_key: i64) -> MemorySyncRepository {
    SyncRepository::new(
        config,
        MemoryRemote::starting_at(first_server_key),
        MemoryStoreFactory::new(),
    )
}

/// A file-backed repository in a temporary directory.
pub struct TestFileRepository {
    /// The repository.
    pub repository: FileSyncRepository,
    /// The temporary directory (kept alive to prevent cleanup).
    dir: TempDir,
}

impl TestFileRepository {
    /// Creates a repository in a fresh temporary directory.
    pub fn new(config: RepositoryConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            repository: SyncRepository::new(
                config,
                MemoryRemote::new(),
                FileStoreFactory::new(dir.path()),
            ),
            dir,
        }
    }

    /// Drops the repository and opens a new one over the same directory,
    /// as a process restart would.
    pub fn reopen(self, config: RepositoryConfig, remote: MemoryRemote<Customer>) -> Self {
        let Self { repository, dir } = self;
        // Releases the directory lock
        drop(repository);
        Self {
            repository: SyncRepository::new(config, remote, FileStoreFactory::new(dir.path())),
            dir,
        }
    }

    /// Returns the directory holding the database.
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl std::ops::Deref for TestFileRepository {
    type Target = FileSyncRepository;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}
