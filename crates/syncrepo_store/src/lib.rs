//! # syncrepo Store
//!
//! Local store driver for syncrepo repositories.
//!
//! This crate provides the lowest-level persistence used while offline:
//! named tables of JSON object records, each indexed by an integer primary
//! key held in a configurable field. The store knows nothing about
//! entities, transaction logs or sync; those live in `syncrepo_core`.
//!
//! ## Design Principles
//!
//! - Tables are declared with a [`TableSchema`] (name, key field, auto-increment)
//! - Rows are returned in ascending key order
//! - Generated keys never repeat within a table
//! - Stores must be `Send + Sync` for shared access
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral storage
//! - [`FileStore`] - For persistent storage in a locked directory
//!
//! ## Example
//!
//! ```rust
//! use syncrepo_store::{LocalStore, MemoryStore, TableSchema};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.create_table(TableSchema::auto("Customer", "id")).unwrap();
//! store.insert("Customer", json!({"id": 0, "name": "Acme"})).unwrap();
//! assert_eq!(store.count("Customer").unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod catalog;
mod error;
mod file;
mod memory;

pub use backend::{LocalStore, Record, StoreFactory, TableSchema};
pub use error::{StoreError, StoreResult};
pub use file::{FileStore, FileStoreFactory};
pub use memory::{MemoryStore, MemoryStoreFactory};
