//! In-memory remote store for testing.

use crate::entity::{Entity, UNASSIGNED_KEY};
use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::Repository;
use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;

/// A call received by a [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall<T> {
    /// `get_all`.
    GetAll,
    /// `get_by_id`.
    GetById(i64),
    /// `insert` with the entity as sent.
    Insert(T),
    /// `update` with the entity as sent.
    Update(T),
    /// `delete_by_id`.
    DeleteById(i64),
    /// `delete_by_entity` with the entity as sent.
    DeleteByEntity(T),
    /// `delete_all`.
    DeleteAll,
}

#[derive(Debug)]
struct State<T> {
    rows: BTreeMap<i64, T>,
    next_key: i64,
    calls: Vec<RemoteCall<T>>,
    reachable: bool,
    attempts: usize,
    fail_at: Option<usize>,
}

/// An in-memory authoritative store.
///
/// Assigns its own keys to inserted entities, so a client-side key is
/// never the key the entity ends up with. Every call that reaches the
/// store is recorded for assertions. Failures can be injected with
/// [`set_reachable`](Self::set_reachable) and
/// [`fail_on_call`](Self::fail_on_call); injected failures are
/// retryable remote errors and are not recorded as calls.
#[derive(Debug)]
pub struct MemoryRemote<T> {
    state: Mutex<State<T>>,
    honor_client_keys: bool,
}

impl<T: Entity> MemoryRemote<T> {
    /// Creates an empty store assigning keys from 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an empty store assigning keys from `first_key`.
    pub fn starting_at(first_key: i64) -> Self {
        Self {
            state: Mutex::new(State {
                rows: BTreeMap::new(),
                next_key: first_key,
                calls: Vec::new(),
                reachable: true,
                attempts: 0,
                fail_at: None,
            }),
            honor_client_keys: false,
        }
    }

    /// Seeds the store with `rows`, keyed by their own keys.
    pub fn with_rows(self, rows: impl IntoIterator<Item = T>) -> Self {
        {
            let mut state = self.state.lock();
            for row in rows {
                let key = row.key();
                state.next_key = state.next_key.max(key.saturating_add(1));
                state.rows.insert(key, row);
            }
        }
        self
    }

    /// Keeps non-zero keys chosen by the client instead of assigning new ones.
    pub fn honoring_client_keys(mut self) -> Self {
        self.honor_client_keys = true;
        self
    }

    /// Returns the stored entities in key order.
    pub fn rows(&self) -> Vec<T> {
        self.state.lock().rows.values().cloned().collect()
    }

    /// Returns the calls received so far.
    pub fn calls(&self) -> Vec<RemoteCall<T>> {
        self.state.lock().calls.clone()
    }

    /// Returns how many calls were received.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Makes every call fail while `false`.
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Makes the `n`-th call from now fail once (1-based).
    pub fn fail_on_call(&self, n: usize) {
        let mut state = self.state.lock();
        state.fail_at = Some(state.attempts + n.max(1));
    }

    fn begin(&self, call: RemoteCall<T>) -> RepositoryResult<MutexGuard<'_, State<T>>> {
        let mut state = self.state.lock();
        state.attempts += 1;

        if !state.reachable {
            return Err(RepositoryError::remote_retryable("remote unreachable"));
        }
        if state.fail_at == Some(state.attempts) {
            state.fail_at = None;
            return Err(RepositoryError::remote_retryable(format!(
                "injected failure on call {}",
                state.attempts
            )));
        }

        state.calls.push(call);
        Ok(state)
    }
}

impl<T: Entity> Default for MemoryRemote<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRemote<T> {
    async fn get_all(&self) -> RepositoryResult<Vec<T>> {
        let state = self.begin(RemoteCall::GetAll)?;
        Ok(state.rows.values().cloned().collect())
    }

    async fn get_by_id(&self, key: i64) -> RepositoryResult<Option<T>> {
        let state = self.begin(RemoteCall::GetById(key))?;
        Ok(state.rows.get(&key).cloned())
    }

    async fn insert(&self, mut entity: T) -> RepositoryResult<Option<T>> {
        let mut state = self.begin(RemoteCall::Insert(entity.clone()))?;

        let key = if self.honor_client_keys && entity.key() != UNASSIGNED_KEY {
            if state.rows.contains_key(&entity.key()) {
                return Ok(None);
            }
            entity.key()
        } else {
            state.next_key
        };

        state.next_key = state.next_key.max(key.saturating_add(1));
        entity.set_key(key);
        state.rows.insert(key, entity.clone());
        Ok(Some(entity))
    }

    async fn update(&self, entity: T) -> RepositoryResult<Option<T>> {
        let mut state = self.begin(RemoteCall::Update(entity.clone()))?;
        match state.rows.get_mut(&entity.key()) {
            Some(row) => {
                *row = entity.clone();
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, key: i64) -> RepositoryResult<bool> {
        let mut state = self.begin(RemoteCall::DeleteById(key))?;
        Ok(state.rows.remove(&key).is_some())
    }

    async fn delete_by_entity(&self, entity: &T) -> RepositoryResult<bool> {
        let mut state = self.begin(RemoteCall::DeleteByEntity(entity.clone()))?;
        Ok(state.rows.remove(&entity.key()).is_some())
    }

    async fn delete_all(&self) -> RepositoryResult<bool> {
        let mut state = self.begin(RemoteCall::DeleteAll)?;
        state.rows.clear();
        Ok(true)
    }
}
