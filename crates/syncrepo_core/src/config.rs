//! Configuration for sync repositories.

use crate::connectivity::ConnectivityMode;
use crate::entity::Entity;

/// Suffix appended to an entity's table name to name its log table.
pub const LOCAL_TRANSACTIONS_SUFFIX: &str = "_LocalTransactions";

/// Configuration for a [`SyncRepository`](crate::SyncRepository).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Name of the local database the tables live in.
    pub db_name: String,
    /// Whether the remote store assigns keys. Offline inserts then reset
    /// the key so the local store assigns a local one.
    pub auto_generate_key: bool,
    /// Connectivity mode before the first notification arrives.
    pub initial_mode: ConnectivityMode,
    /// Suffix of the log table name.
    pub log_suffix: String,
    /// Whether a remote rejection during replay stops the pass.
    pub stop_on_rejection: bool,
}

impl RepositoryConfig {
    /// Creates a configuration for the database `db_name`.
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            auto_generate_key: true,
            initial_mode: ConnectivityMode::Online,
            log_suffix: LOCAL_TRANSACTIONS_SUFFIX.to_string(),
            stop_on_rejection: false,
        }
    }

    /// Sets whether the remote store assigns keys.
    pub fn with_auto_generate_key(mut self, auto_generate_key: bool) -> Self {
        self.auto_generate_key = auto_generate_key;
        self
    }

    /// Sets the initial connectivity mode.
    pub fn with_initial_mode(mut self, mode: ConnectivityMode) -> Self {
        self.initial_mode = mode;
        self
    }

    /// Starts offline.
    pub fn offline(self) -> Self {
        self.with_initial_mode(ConnectivityMode::Offline)
    }

    /// Sets the log table suffix.
    pub fn with_log_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.log_suffix = suffix.into();
        self
    }

    /// Sets whether a rejected replay stops the pass.
    pub fn with_stop_on_rejection(mut self, stop: bool) -> Self {
        self.stop_on_rejection = stop;
        self
    }

    /// Returns the name of the local table holding `T`.
    pub fn entity_table<T: Entity>(&self) -> String {
        T::NAME.to_string()
    }

    /// Returns the name of the log table for `T`.
    pub fn log_table<T: Entity>(&self) -> String {
        self.log_table_for(T::NAME)
    }

    /// Returns the name of the log table for entities stored in `entity_table`.
    pub fn log_table_for(&self, entity_table: &str) -> String {
        format!("{}{}", entity_table, self.log_suffix)
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::new("RepositoryDemo")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_entity::Account;

    #[test]
    fn defaults() {
        let config = RepositoryConfig::new("app");
        assert_eq!(config.db_name, "app");
        assert!(config.auto_generate_key);
        assert_eq!(config.initial_mode, ConnectivityMode::Online);
        assert!(!config.stop_on_rejection);
        assert_eq!(config.entity_table::<Account>(), "Account");
        assert_eq!(config.log_table::<Account>(), "Account_LocalTransactions");
    }

    #[test]
    fn builder() {
        let config = RepositoryConfig::new("app")
            .with_auto_generate_key(false)
            .offline()
            .with_log_suffix("_Pending")
            .with_stop_on_rejection(true);

        assert!(!config.auto_generate_key);
        assert_eq!(config.initial_mode, ConnectivityMode::Offline);
        assert!(config.stop_on_rejection);
        assert_eq!(config.log_table_for("Customer"), "Customer_Pending");
    }
}
