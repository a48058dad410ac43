//! Error types for repository and sync operations.

use crate::transaction::ActionKind;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur in repository and sync operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Network or HTTP error from the remote store.
    #[error("remote error: {message}")]
    Remote {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Local store error.
    #[error("local store error: {0}")]
    Store(#[from] syncrepo_store::StoreError),

    /// An entity or log record could not be converted.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A filter referenced a value it cannot compare.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Replay of a log entry failed; the entry and its successors stay in the log.
    #[error("replay of {action} (seq {seq}) failed: {source}")]
    Replay {
        /// Log sequence number of the failing entry.
        seq: i64,
        /// Action of the failing entry.
        action: ActionKind,
        /// The underlying failure.
        #[source]
        source: Box<RepositoryError>,
    },

    /// The remote store rejected a replayed entry and rejections stop replay.
    #[error("remote rejected {action} (seq {seq}): {reason}")]
    Rejected {
        /// Log sequence number of the rejected entry.
        seq: i64,
        /// Action of the rejected entry.
        action: ActionKind,
        /// Why the entry was rejected.
        reason: String,
    },

    /// Sync was requested while the repository is offline.
    #[error("not connected to remote store")]
    NotConnected,
}

impl RepositoryError {
    /// Creates a retryable remote error.
    pub fn remote_retryable(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable remote error.
    pub fn remote_fatal(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            RepositoryError::Remote { retryable, .. } => *retryable,
            RepositoryError::NotConnected => true,
            RepositoryError::Replay { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(RepositoryError::remote_retryable("connection reset").is_retryable());
        assert!(!RepositoryError::remote_fatal("bad request").is_retryable());
        assert!(RepositoryError::NotConnected.is_retryable());
        assert!(!RepositoryError::InvalidFilter("x".into()).is_retryable());
    }

    #[test]
    fn replay_error_wraps_source() {
        let err = RepositoryError::Replay {
            seq: 3,
            action: ActionKind::UpdateById,
            source: Box::new(RepositoryError::remote_retryable("timeout")),
        };
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "replay of UpdateById (seq 3) failed: remote error: timeout"
        );
    }
}
