//! # syncrepo Core
//!
//! Offline-first repository with a transaction log and replay.
//!
//! This crate provides:
//! - The [`Repository`] contract (CRUD plus declarative [`QueryFilter`] queries)
//! - [`SyncRepository`], which routes operations by connectivity
//! - [`LocalRepository`], the offline variant backed by a local store
//! - [`TransactionLog`] of [`LocalTransaction`] entries per entity type
//! - [`SyncEngine`], which replays the log and reconciles server keys
//! - Remote clients: [`HttpRemote`] over an [`HttpClient`], and [`MemoryRemote`]
//!
//! ## Architecture
//!
//! ```text
//! caller ──▶ SyncRepository ──online──▶ remote client
//!                  │
//!               offline
//!                  ▼
//!           LocalRepository ──▶ <Entity> table
//!                  │
//!                  └──────────▶ <Entity>_LocalTransactions table
//!
//! offline → online: SyncEngine replays the log into the remote client
//! ```
//!
//! ## Key Invariants
//!
//! - The online path never writes the log
//! - Every successful offline mutation appends exactly one log entry
//! - Replay follows append order, one remote call at a time
//! - A replayed entry leaves the log only after the remote call succeeded
//! - Reconciliation rewrites keys in pending log entries, never the local table

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connectivity;
mod engine;
mod entity;
mod error;
mod filter;
mod local;
mod log;
pub mod remote;
mod repository;
mod router;
mod transaction;

pub use config::{RepositoryConfig, LOCAL_TRANSACTIONS_SUFFIX};
pub use connectivity::{spawn_connectivity_listener, ConnectivityMode};
pub use engine::{Rejection, SyncEngine, SyncReport, SyncStats};
pub use entity::{Entity, UNASSIGNED_KEY};
pub use error::{RepositoryError, RepositoryResult};
pub use filter::{Condition, FilterOp, QueryFilter, SortDirection};
pub use local::LocalRepository;
pub use log::{log_table_schema, LogEntry, TransactionLog, LOG_KEY_FIELD};
pub use remote::{HttpClient, HttpRemote, HttpRequest, HttpResponse, MemoryRemote, Method, RemoteCall};
pub use repository::Repository;
pub use router::{LocalFor, SyncRepository};
pub use transaction::{ActionKind, LocalTransaction};

pub use async_trait::async_trait;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
