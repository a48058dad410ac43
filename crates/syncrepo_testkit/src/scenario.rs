//! Scenario harness comparing offline-then-sync with direct online execution.
//!
//! The same [`Op`] script is run twice against fresh remotes that hand out
//! the same keys: once directly online, once offline followed by a sync.
//! Replay preserves operation order, so both remotes must end up equal.

use crate::fixtures::{memory_repository, Customer, TEST_DB};
use crate::generators::Op;
use syncrepo_core::{LogEntry, Repository, RepositoryConfig, RepositoryResult, SyncReport};

/// Result of running a script offline and then syncing.
#[derive(Debug)]
pub struct OfflineRun {
    /// Log entries recorded before the sync.
    pub recorded: Vec<LogEntry<Customer>>,
    /// Report of the sync pass.
    pub report: SyncReport,
    /// Remote rows after the sync.
    pub remote_rows: Vec<Customer>,
    /// Log entries left after the sync.
    pub pending_after: usize,
}

/// Runs mutation scripts in both modes.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioHarness {
    first_server_key: i64,
}

impl ScenarioHarness {
    /// Creates a harness whose remotes assign keys from `first_server_key`.
    pub fn new(first_server_key: i64) -> Self {
        Self { first_server_key }
    }

    /// Runs `script` directly against an online repository and returns
    /// the remote rows.
    pub async fn run_online(&self, script: &[Op]) -> RepositoryResult<Vec<Customer>> {
        let repo = memory_repository(RepositoryConfig::new(TEST_DB), self.first_server_key);
        apply_script(&repo, script).await?;
        Ok(repo.remote().rows())
    }

    /// Runs `script` offline, reconnects and returns what the sync did.
    pub async fn run_offline_then_sync(&self, script: &[Op]) -> RepositoryResult<OfflineRun> {
        let repo = memory_repository(
            RepositoryConfig::new(TEST_DB).offline(),
            self.first_server_key,
        );
        apply_script(&repo, script).await?;

        let recorded = repo.pending_transactions()?;
        let report = repo
            .on_connectivity_changed(true)
            .await?
            .unwrap_or_default();

        Ok(OfflineRun {
            recorded,
            report,
            remote_rows: repo.remote().rows(),
            pending_after: repo.pending_transactions()?.len(),
        })
    }
}

/// Applies `script` to `repo`. Steps targeting an empty list are skipped.
pub async fn apply_script(repo: &dyn Repository<Customer>, script: &[Op]) -> RepositoryResult<()> {
    for op in script {
        match op {
            Op::Insert { name } => {
                repo.insert(Customer::new(name.as_str())).await?;
            }
            Op::Update { target, name } => {
                if let Some(mut customer) = pick(repo, *target).await? {
                    customer.name = name.clone();
                    repo.update(customer).await?;
                }
            }
            Op::DeleteById { target } => {
                if let Some(customer) = pick(repo, *target).await? {
                    repo.delete_by_id(customer.id).await?;
                }
            }
            Op::DeleteByEntity { target } => {
                if let Some(customer) = pick(repo, *target).await? {
                    repo.delete_by_entity(&customer).await?;
                }
            }
            Op::DeleteAll => {
                repo.delete_all().await?;
            }
        }
    }
    Ok(())
}

async fn pick(repo: &dyn Repository<Customer>, target: usize) -> RepositoryResult<Option<Customer>> {
    let mut all = repo.get_all().await?;
    if all.is_empty() {
        return Ok(None);
    }
    let index = target % all.len();
    Ok(Some(all.swap_remove(index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncrepo_core::ActionKind;

    fn insert(name: &str) -> Op {
        Op::Insert {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_rename_matches_online() {
        let script = [
            insert("Acme"),
            insert("Globex"),
            Op::Update {
                target: 0,
                name: "Acme Corp".into(),
            },
            Op::DeleteById { target: 1 },
        ];
        let harness = ScenarioHarness::new(57);

        let online = harness.run_online(&script).await.unwrap();
        let offline = harness.run_offline_then_sync(&script).await.unwrap();

        assert_eq!(online, [Customer::new("Acme Corp").with_id(57)]);
        assert_eq!(offline.remote_rows, online);
        assert_eq!(offline.recorded.len(), 4);
        assert_eq!(offline.report.reconciled, 2);
        assert_eq!(offline.pending_after, 0);
    }

    #[tokio::test]
    async fn delete_by_entity_is_recorded_as_delete_by_id() {
        let script = [insert("Acme"), Op::DeleteByEntity { target: 0 }];
        let offline = ScenarioHarness::new(1)
            .run_offline_then_sync(&script)
            .await
            .unwrap();

        assert_eq!(offline.recorded[1].transaction.action, ActionKind::DeleteById);
        assert!(offline.remote_rows.is_empty());
    }

    #[tokio::test]
    async fn empty_script_syncs_nothing() {
        let offline = ScenarioHarness::new(1).run_offline_then_sync(&[]).await.unwrap();
        assert!(offline.recorded.is_empty());
        assert_eq!(offline.report.replayed, 0);
    }
}
