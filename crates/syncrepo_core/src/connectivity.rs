//! Connectivity state and signal plumbing.

use crate::entity::Entity;
use crate::repository::Repository;
use crate::router::SyncRepository;
use std::fmt;
use std::sync::Arc;
use syncrepo_store::StoreFactory;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Which store a repository currently serves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityMode {
    /// Operations go to the remote store.
    Online,
    /// Operations go to the local store and are logged for replay.
    Offline,
}

impl ConnectivityMode {
    /// Returns the mode for an online flag.
    pub fn from_online(is_online: bool) -> Self {
        if is_online {
            ConnectivityMode::Online
        } else {
            ConnectivityMode::Offline
        }
    }

    /// Returns true for [`ConnectivityMode::Online`].
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityMode::Online)
    }
}

impl fmt::Display for ConnectivityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityMode::Online => write!(f, "online"),
            ConnectivityMode::Offline => write!(f, "offline"),
        }
    }
}

/// Forwards every value published on `signal` to
/// [`SyncRepository::on_connectivity_changed`].
///
/// The value current at spawn time is delivered first. The task ends when
/// every sender is dropped. Sync failures are logged; the entries stay in
/// the log for the next transition.
pub fn spawn_connectivity_listener<T, R, F>(
    repository: Arc<SyncRepository<T, R, F>>,
    mut signal: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    T: Entity,
    R: Repository<T> + 'static,
    F: StoreFactory + 'static,
{
    tokio::spawn(async move {
        loop {
            let is_online = *signal.borrow_and_update();
            match repository.on_connectivity_changed(is_online).await {
                Ok(Some(report)) => {
                    tracing::info!(
                        replayed = report.replayed,
                        rejected = report.rejected.len(),
                        "synced after reconnect"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "sync after reconnect failed");
                }
            }

            if signal.changed().await.is_err() {
                break;
            }
        }
        tracing::debug!("connectivity signal closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_flag() {
        assert_eq!(ConnectivityMode::from_online(true), ConnectivityMode::Online);
        assert_eq!(ConnectivityMode::from_online(false), ConnectivityMode::Offline);
        assert!(ConnectivityMode::Online.is_online());
        assert!(!ConnectivityMode::Offline.is_online());
        assert_eq!(ConnectivityMode::Offline.to_string(), "offline");
    }
}
