//! Replaying an offline script must reproduce direct online execution.

use proptest::prelude::*;
use syncrepo_testkit::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn offline_then_sync_matches_online(
        script in script_strategy(24),
        first_key in first_server_key_strategy(),
    ) {
        let harness = ScenarioHarness::new(first_key);
        let (online, offline) = runtime().block_on(async {
            let online = harness.run_online(&script).await.expect("online run");
            let offline = harness.run_offline_then_sync(&script).await.expect("offline run");
            (online, offline)
        });

        prop_assert_eq!(&offline.remote_rows, &online);
        prop_assert_eq!(offline.pending_after, 0);
        prop_assert_eq!(offline.report.replayed, offline.recorded.len());
        prop_assert!(offline.report.is_clean());
    }

    #[test]
    fn one_log_entry_per_effective_mutation(script in script_strategy(24)) {
        let offline = runtime()
            .block_on(ScenarioHarness::new(1).run_offline_then_sync(&script))
            .expect("offline run");

        // Steps that target an empty list are skipped, everything else is logged
        prop_assert!(offline.recorded.len() <= script.len());
        let inserts = script.iter().filter(|op| matches!(op, Op::Insert { .. })).count();
        let logged_inserts = offline
            .recorded
            .iter()
            .filter(|e| e.transaction.action == syncrepo_core::ActionKind::Insert)
            .count();
        prop_assert_eq!(logged_inserts, inserts);
    }
}

#[test]
fn sample_customers_round_trip_through_sync() {
    let script: Vec<Op> = sample_customers()
        .into_iter()
        .map(|c| Op::Insert { name: c.name })
        .chain([Op::DeleteById { target: 2 }, Op::Update { target: 0, name: "Acme AS".into() }])
        .collect();

    let harness = ScenarioHarness::new(3);
    let (online, offline) = runtime().block_on(async {
        (
            harness.run_online(&script).await.expect("online run"),
            harness.run_offline_then_sync(&script).await.expect("offline run"),
        )
    });

    assert_eq!(offline.remote_rows, online);
    assert_eq!(online.len(), 3);
}
