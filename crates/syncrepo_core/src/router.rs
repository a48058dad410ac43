//! Connectivity-aware repository routing between remote and local stores.

use crate::config::RepositoryConfig;
use crate::connectivity::ConnectivityMode;
use crate::engine::{SyncEngine, SyncReport, SyncStats};
use crate::entity::Entity;
use crate::error::{RepositoryError, RepositoryResult};
use crate::filter::QueryFilter;
use crate::local::LocalRepository;
use crate::log::LogEntry;
use crate::repository::Repository;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use syncrepo_store::StoreFactory;

/// Local repository type opened from a store factory `F`.
pub type LocalFor<T, F> = LocalRepository<T, <F as StoreFactory>::Store>;

/// The repository variant selected for one operation.
enum Route<'a, T: Entity, R, F: StoreFactory> {
    Online(&'a R),
    Offline(Arc<LocalFor<T, F>>),
}

impl<'a, T: Entity, R: Repository<T>, F: StoreFactory> Route<'a, T, R, F> {
    fn repository(&self) -> &dyn Repository<T> {
        match self {
            Route::Online(remote) => *remote,
            Route::Offline(local) => local.as_ref(),
        }
    }
}

/// A repository that serves from the remote store while online and from
/// the local store while offline, replaying offline changes on reconnect.
///
/// Online, every operation is passed to the remote client unchanged and
/// nothing is logged. Offline, operations run against the local store and
/// each successful mutation appends one entry to the transaction log.
///
/// # Concurrency
///
/// Mutations and sync passes take a per-repository gate, so a mutation
/// never interleaves with a replay and a replay's final clear cannot drop
/// an entry appended while it ran. The route is chosen after the gate is
/// taken. Reads do not take the gate.
///
/// # Example
///
/// ```rust,ignore
/// let repository = SyncRepository::new(
///     RepositoryConfig::new("RepositoryDemo"),
///     HttpRemote::new("https://api.example.com", client),
///     FileStoreFactory::new("data"),
/// );
///
/// repository.on_connectivity_changed(false).await?;
/// repository.insert(Customer::new("Acme")).await?;
///
/// // Replays the insert and clears the log
/// let report = repository.on_connectivity_changed(true).await?;
/// ```
pub struct SyncRepository<T: Entity, R, F: StoreFactory> {
    config: RepositoryConfig,
    remote: R,
    factory: F,
    local: Mutex<Option<Arc<LocalFor<T, F>>>>,
    online: AtomicBool,
    gate: tokio::sync::Mutex<()>,
    stats: RwLock<SyncStats>,
}

impl<T, R, F> SyncRepository<T, R, F>
where
    T: Entity,
    R: Repository<T>,
    F: StoreFactory,
{
    /// Creates a repository. The local store is opened on first use.
    pub fn new(config: RepositoryConfig, remote: R, factory: F) -> Self {
        let online = config.initial_mode.is_online();
        Self {
            config,
            remote,
            factory,
            local: Mutex::new(None),
            online: AtomicBool::new(online),
            gate: tokio::sync::Mutex::new(()),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Returns true if operations currently go to the remote store.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Sets the connectivity flag without triggering a sync.
    ///
    /// For host state injection, e.g. at startup before a monitor attaches.
    pub fn set_online(&self, is_online: bool) {
        self.online.store(is_online, Ordering::SeqCst);
    }

    /// Returns the current mode.
    pub fn mode(&self) -> ConnectivityMode {
        ConnectivityMode::from_online(self.is_online())
    }

    /// Handles a connectivity notification.
    ///
    /// Going from offline to online runs a sync pass before returning and
    /// yields its report. Going offline only flips the flag. A repeated
    /// value does nothing.
    pub async fn on_connectivity_changed(
        &self,
        is_online: bool,
    ) -> RepositoryResult<Option<SyncReport>> {
        let was_online = self.online.swap(is_online, Ordering::SeqCst);
        if was_online == is_online {
            return Ok(None);
        }

        tracing::info!(
            table = %self.config.entity_table::<T>(),
            mode = %ConnectivityMode::from_online(is_online),
            "connectivity changed"
        );

        if is_online {
            self.sync_local_to_server().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Replays the transaction log against the remote store.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` while offline, and the engine's error if the
    /// pass stops early. Entries not yet replayed stay in the log.
    pub async fn sync_local_to_server(&self) -> RepositoryResult<SyncReport> {
        let _gate = self.gate.lock().await;

        if !self.is_online() {
            return Err(RepositoryError::NotConnected);
        }

        let local = self.local()?;
        let result = SyncEngine::new(local.log(), &self.remote)
            .with_stop_on_rejection(self.config.stop_on_rejection)
            .replay()
            .await;

        match &result {
            Ok(report) => self.stats.write().record(report),
            Err(e) => {
                tracing::warn!(table = %local.log().table(), error = %e, "sync pass failed");
                self.stats.write().last_error = Some(e.to_string());
            }
        }
        result
    }

    /// Returns the log entries waiting for replay, in replay order.
    pub fn pending_transactions(&self) -> RepositoryResult<Vec<LogEntry<T>>> {
        self.local()?.log().entries()
    }

    /// Returns sync statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the remote client.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns the local repository, opening the store on first use.
    pub fn local(&self) -> RepositoryResult<Arc<LocalFor<T, F>>> {
        let mut slot = self.local.lock();
        if let Some(local) = slot.as_ref() {
            return Ok(Arc::clone(local));
        }

        let store = self.factory.open(&self.config.db_name)?;
        let local = Arc::new(LocalRepository::open(Arc::new(store), &self.config)?);
        tracing::debug!(db = %self.config.db_name, table = %local.table(), "opened local store");

        *slot = Some(Arc::clone(&local));
        Ok(local)
    }

    fn route(&self) -> RepositoryResult<Route<'_, T, R, F>> {
        if self.is_online() {
            Ok(Route::Online(&self.remote))
        } else {
            Ok(Route::Offline(self.local()?))
        }
    }

    /// Route for a mutation. An offline store that cannot be opened is
    /// logged and yields `None`, so the mutation reports `None`/`false`.
    fn mutation_route(&self) -> Option<Route<'_, T, R, F>> {
        match self.route() {
            Ok(route) => Some(route),
            Err(e) => {
                tracing::warn!(db = %self.config.db_name, error = %e, "local store unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl<T, R, F> Repository<T> for SyncRepository<T, R, F>
where
    T: Entity,
    R: Repository<T>,
    F: StoreFactory,
{
    async fn get_all(&self) -> RepositoryResult<Vec<T>> {
        self.route()?.repository().get_all().await
    }

    async fn get_by_id(&self, key: i64) -> RepositoryResult<Option<T>> {
        self.route()?.repository().get_by_id(key).await
    }

    async fn get(&self, filter: &QueryFilter<T>) -> RepositoryResult<Vec<T>> {
        self.route()?.repository().get(filter).await
    }

    async fn insert(&self, entity: T) -> RepositoryResult<Option<T>> {
        let _gate = self.gate.lock().await;
        match self.mutation_route() {
            Some(route) => route.repository().insert(entity).await,
            None => Ok(None),
        }
    }

    async fn update(&self, entity: T) -> RepositoryResult<Option<T>> {
        let _gate = self.gate.lock().await;
        match self.mutation_route() {
            Some(route) => route.repository().update(entity).await,
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, key: i64) -> RepositoryResult<bool> {
        let _gate = self.gate.lock().await;
        match self.mutation_route() {
            Some(route) => route.repository().delete_by_id(key).await,
            None => Ok(false),
        }
    }

    async fn delete_by_entity(&self, entity: &T) -> RepositoryResult<bool> {
        let _gate = self.gate.lock().await;
        match self.mutation_route() {
            Some(route) => route.repository().delete_by_entity(entity).await,
            None => Ok(false),
        }
    }

    async fn delete_all(&self) -> RepositoryResult<bool> {
        let _gate = self.gate.lock().await;
        match self.mutation_route() {
            Some(route) => route.repository().delete_all().await,
            None => Ok(false),
        }
    }
}
