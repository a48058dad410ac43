//! Replay of the transaction log against the remote store.

use crate::entity::Entity;
use crate::error::{RepositoryError, RepositoryResult};
use crate::log::{LogEntry, TransactionLog};
use crate::repository::Repository;
use crate::transaction::ActionKind;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use syncrepo_store::LocalStore;

/// Statistics about sync passes of one repository.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Number of passes that drained the log.
    pub passes_completed: u64,
    /// Total number of log entries replayed.
    pub transactions_replayed: u64,
    /// Total number of log entries whose key was remapped.
    pub keys_reconciled: u64,
    /// Total number of entries the remote store rejected.
    pub rejections: u64,
    /// Time of the last completed pass.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

impl SyncStats {
    /// Folds a completed pass into the totals.
    pub fn record(&mut self, report: &SyncReport) {
        self.passes_completed += 1;
        self.transactions_replayed += report.replayed as u64;
        self.keys_reconciled += report.reconciled as u64;
        self.rejections += report.rejected.len() as u64;
        self.last_sync_time = Some(Instant::now());
        self.last_error = None;
    }
}

/// A log entry the remote store answered with "not found" or "not applied".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Log sequence number.
    pub seq: i64,
    /// Replayed action.
    pub action: ActionKind,
    /// What the remote store answered.
    pub reason: String,
}

/// Result of one sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Number of entries replayed, rejected ones included.
    pub replayed: usize,
    /// Number of later entries whose key was remapped to a server key.
    pub reconciled: usize,
    /// Entries the remote store rejected.
    pub rejected: Vec<Rejection>,
    /// Duration of the pass.
    pub duration: Duration,
}

impl SyncReport {
    /// Returns true if every entry was applied by the remote store.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// What the remote store did with one entry.
enum Outcome {
    Applied,
    Inserted { offline_key: i64, server_key: i64 },
    Rejected(String),
}

/// Replays a transaction log against a remote repository.
///
/// Entries are sent strictly in log order, each awaited before the next.
/// After every remote success the entry is removed from the log; a
/// transport failure stops the pass and leaves the failing entry and its
/// successors in place, so the next pass resumes there.
pub struct SyncEngine<'a, T, R: ?Sized, S> {
    log: &'a TransactionLog<T, S>,
    remote: &'a R,
    stop_on_rejection: bool,
}

impl<'a, T, R, S> SyncEngine<'a, T, R, S>
where
    T: Entity,
    R: Repository<T> + ?Sized,
    S: LocalStore,
{
    /// Creates an engine replaying `log` into `remote`.
    pub fn new(log: &'a TransactionLog<T, S>, remote: &'a R) -> Self {
        Self {
            log,
            remote,
            stop_on_rejection: false,
        }
    }

    /// Makes a remote rejection stop the pass with an error.
    pub fn with_stop_on_rejection(mut self, stop: bool) -> Self {
        self.stop_on_rejection = stop;
        self
    }

    /// Runs one pass over the whole log.
    ///
    /// # Errors
    ///
    /// Returns `Replay` (wrapping the remote error) when a remote call
    /// fails, `Rejected` when a rejection stops the pass, and local store
    /// errors from reading or rewriting the log.
    pub async fn replay(&self) -> RepositoryResult<SyncReport> {
        let start = Instant::now();
        let mut report = SyncReport::default();

        let mut pending: VecDeque<LogEntry<T>> = self.log.entries()?.into();
        if pending.is_empty() {
            report.duration = start.elapsed();
            return Ok(report);
        }

        tracing::info!(table = %self.log.table(), pending = pending.len(), "replaying local transactions");

        while let Some(entry) = pending.pop_front() {
            let action = entry.transaction.action;
            let outcome = self
                .dispatch(&entry)
                .await
                .map_err(|e| RepositoryError::Replay {
                    seq: entry.seq,
                    action,
                    source: Box::new(e),
                })?;

            match outcome {
                Outcome::Applied => {
                    tracing::debug!(seq = entry.seq, action = %action, "replayed");
                }
                Outcome::Inserted {
                    offline_key,
                    server_key,
                } => {
                    tracing::debug!(seq = entry.seq, offline_key, server_key, "replayed insert");
                    report.reconciled += self.reconcile(&mut pending, offline_key, server_key)?;
                }
                Outcome::Rejected(reason) => {
                    tracing::warn!(seq = entry.seq, action = %action, reason = %reason, "remote rejected replayed transaction");
                    if self.stop_on_rejection {
                        return Err(RepositoryError::Rejected {
                            seq: entry.seq,
                            action,
                            reason,
                        });
                    }
                    report.rejected.push(Rejection {
                        seq: entry.seq,
                        action,
                        reason,
                    });
                }
            }

            self.log.acknowledge(entry.seq)?;
            report.replayed += 1;
        }

        self.log.clear()?;
        report.duration = start.elapsed();

        tracing::info!(
            table = %self.log.table(),
            replayed = report.replayed,
            reconciled = report.reconciled,
            rejected = report.rejected.len(),
            "sync pass complete"
        );
        Ok(report)
    }

    async fn dispatch(&self, entry: &LogEntry<T>) -> RepositoryResult<Outcome> {
        let transaction = &entry.transaction;

        match (transaction.action, transaction.entity.as_ref()) {
            (ActionKind::Insert, Some(entity)) => {
                let offline_key = entity.key();
                Ok(match self.remote.insert(entity.clone()).await? {
                    Some(server) => Outcome::Inserted {
                        offline_key,
                        server_key: server.key(),
                    },
                    None => Outcome::Rejected("remote returned no record".into()),
                })
            }
            (ActionKind::UpdateById, Some(entity)) => {
                Ok(match self.remote.update(entity.clone()).await? {
                    Some(_) => Outcome::Applied,
                    None => Outcome::Rejected(format!("no remote entity with key {}", entity.key())),
                })
            }
            (ActionKind::DeleteById, _) => match transaction.target_key() {
                Some(key) => Ok(applied_if(
                    self.remote.delete_by_id(key).await?,
                    format!("no remote entity with key {}", key),
                )),
                None => Ok(Outcome::Rejected("log entry has no id".into())),
            },
            (ActionKind::DeleteByEntity, Some(entity)) => Ok(applied_if(
                self.remote.delete_by_entity(entity).await?,
                format!("no remote entity with key {}", entity.key()),
            )),
            (ActionKind::DeleteAll, _) => Ok(applied_if(
                self.remote.delete_all().await?,
                "remote did not delete".to_string(),
            )),
            (
                action @ (ActionKind::Insert | ActionKind::UpdateById | ActionKind::DeleteByEntity),
                None,
            ) => Ok(Outcome::Rejected(format!("{} entry has no entity", action))),
        }
    }

    /// Remaps `offline_key` to `server_key` in every entry still pending,
    /// persisting each rewritten entry. Returns how many changed.
    fn reconcile(
        &self,
        pending: &mut VecDeque<LogEntry<T>>,
        offline_key: i64,
        server_key: i64,
    ) -> RepositoryResult<usize> {
        let mut changed = 0;
        for entry in pending.iter_mut() {
            if entry.transaction.remap_key(offline_key, server_key) {
                self.log.rewrite(entry)?;
                changed += 1;
            }
        }
        if changed > 0 {
            tracing::debug!(offline_key, server_key, changed, "reconciled pending keys");
        }
        Ok(changed)
    }
}

fn applied_if(applied: bool, reason: String) -> Outcome {
    if applied {
        Outcome::Applied
    } else {
        Outcome::Rejected(reason)
    }
}
