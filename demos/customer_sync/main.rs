//! Offline-first Customer Example
//!
//! This example demonstrates the offline round trip:
//! - Writing customers while offline (local keys, logged mutations)
//! - Querying the local table with a filter
//! - Reconnecting, which replays the log against the remote store
//! - Server keys replacing local keys in later log entries
//!
//! Run with: cargo run -p customer_sync
//! Set `RUST_LOG=debug` to watch every replayed entry.

use serde::{Deserialize, Serialize};
use syncrepo_core::{
    Entity, FilterOp, MemoryRemote, QueryFilter, Repository, RepositoryConfig, RepositoryError,
    RepositoryResult, SortDirection, SyncRepository,
};
use syncrepo_store::MemoryStoreFactory;
use tracing_subscriber::EnvFilter;

/// A customer, stored with PascalCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Customer {
    id: i64,
    name: String,
    city: String,
}

impl Customer {
    fn new(name: &str, city: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            city: city.to_string(),
        }
    }
}

impl Entity for Customer {
    const NAME: &'static str = "Customer";
    const KEY_FIELD: &'static str = "Id";

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }
}

#[tokio::main]
async fn main() -> RepositoryResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== syncrepo Customer Example ===\n");

    // The remote store already holds 56 customers, so it hands out 57 next
    let repo = SyncRepository::new(
        RepositoryConfig::new("RepositoryDemo").offline(),
        MemoryRemote::<Customer>::starting_at(57),
        MemoryStoreFactory::new(),
    );

    println!("Mode: {}\n", repo.mode());

    // Offline writes go to the local table and the log
    println!("Writing offline...");
    let Some(acme) = repo.insert(Customer::new("Acme", "Oslo")).await? else {
        return Err(RepositoryError::remote_fatal("insert returned nothing"));
    };
    println!("  Inserted {} with local key {}", acme.name, acme.id);

    let globex = repo.insert(Customer::new("Globex", "Bergen")).await?;
    if let Some(globex) = &globex {
        println!("  Inserted {} with local key {}", globex.name, globex.id);
    }

    let renamed = Customer {
        name: "Acme Corp".to_string(),
        ..acme.clone()
    };
    repo.update(renamed).await?;
    println!("  Renamed Acme to Acme Corp");

    let in_oslo = repo
        .get(
            &QueryFilter::new()
                .filter("City", FilterOp::Eq, "Oslo")
                .order_by("Name", SortDirection::Ascending),
        )
        .await?;
    println!("  Customers in Oslo: {}", in_oslo.len());

    println!("\nPending log entries:");
    for entry in repo.pending_transactions()? {
        let key = entry.transaction.target_key().unwrap_or_default();
        println!("  #{} {} (key {})", entry.seq, entry.transaction.action, key);
    }

    // Reconnecting replays the log
    println!("\nReconnecting...");
    if let Some(report) = repo.on_connectivity_changed(true).await? {
        println!(
            "  Replayed {} entries, reconciled {} keys in {:?}",
            report.replayed, report.reconciled, report.duration
        );
        for rejection in &report.rejected {
            println!(
                "  Rejected #{} {}: {}",
                rejection.seq, rejection.action, rejection.reason
            );
        }
    }

    println!("\nRemote store:");
    for customer in repo.remote().rows() {
        println!("  {:>3}  {:<10} {}", customer.id, customer.name, customer.city);
    }

    println!("\nLocal table (keys are not rewritten):");
    for customer in repo.local()?.get_all().await? {
        println!("  {:>3}  {:<10} {}", customer.id, customer.name, customer.city);
    }

    let stats = repo.stats();
    println!(
        "\nPending after sync: {}, passes completed: {}",
        repo.pending_transactions()?.len(),
        stats.passes_completed
    );

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
