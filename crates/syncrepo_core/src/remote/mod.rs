//! Remote store clients.
//!
//! A remote client is any [`Repository`](crate::Repository) implementation
//! backed by the authoritative store. This module provides:
//!
//! - [`HttpRemote`] - REST mapping over a pluggable [`HttpClient`]
//! - [`MemoryRemote`] - An in-memory authoritative store for tests and demos

mod http;
mod memory;

pub use http::{HttpClient, HttpRemote, HttpRequest, HttpResponse, Method};
pub use memory::{MemoryRemote, RemoteCall};
