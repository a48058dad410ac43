//! Error types for local store operations.

use std::io;
use thiserror::Error;

/// Result type for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during local store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The table was never created in this database.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A row with this primary key already exists.
    #[error("duplicate key {key} in table {table}")]
    DuplicateKey {
        /// Table name.
        table: String,
        /// The conflicting key.
        key: i64,
    },

    /// The record's primary-key field is missing or not an integer.
    #[error("invalid key in table {table}: {message}")]
    InvalidKey {
        /// Table name.
        table: String,
        /// What was wrong with the key.
        message: String,
    },

    /// The record is not a JSON object.
    #[error("invalid record for table {table}: expected an object")]
    InvalidRecord {
        /// Table name.
        table: String,
    },

    /// Encoding or decoding of persisted tables failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// The persisted snapshot is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the database lock.
    #[error("database locked: another process has exclusive access")]
    Locked,
}

impl StoreError {
    pub(crate) fn invalid_key(table: &str, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::DuplicateKey {
            table: "Customer".into(),
            key: 7,
        };
        assert_eq!(err.to_string(), "duplicate key 7 in table Customer");

        let err = StoreError::invalid_key("Customer", "not an integer");
        assert!(err.to_string().contains("not an integer"));
    }
}
