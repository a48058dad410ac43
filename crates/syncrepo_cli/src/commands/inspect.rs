//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use syncrepo_core::LOCAL_TRANSACTIONS_SUFFIX;
use syncrepo_store::LocalStore;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database name.
    pub database: String,
    /// Database directory.
    pub path: String,
    /// Per-table statistics, in name order.
    pub tables: Vec<TableStats>,
    /// Total pending log entries across all entity types.
    pub pending_transactions: usize,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table name.
    pub name: String,
    /// Number of rows.
    pub rows: usize,
    /// Whether the table is a transaction log.
    pub log: bool,
}

/// Runs the inspect command.
pub fn run(root: &Path, db: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(root, db)?;
    let mut result = collect(&store)?;
    result.database = db.to_string();
    result.path = store.path().display().to_string();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Gathers table statistics from `store`.
pub fn collect(store: &dyn LocalStore) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut names = store.tables()?;
    names.sort();

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let rows = store.count(&name)?;
        let log = name.ends_with(LOCAL_TRANSACTIONS_SUFFIX);
        tables.push(TableStats { name, rows, log });
    }
    let pending_transactions = tables.iter().filter(|t| t.log).map(|t| t.rows).sum();

    Ok(InspectResult {
        database: String::new(),
        path: String::new(),
        tables,
        pending_transactions,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Database: {} ({})", result.database, result.path);
    println!();
    if result.tables.is_empty() {
        println!("No tables");
        return;
    }

    let width = result
        .tables
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0);

    println!("{:<width$}  {:>8}", "Table", "Rows", width = width);
    for table in &result.tables {
        let marker = if table.log { "  (log)" } else { "" };
        println!(
            "{:<width$}  {:>8}{}",
            table.name,
            table.rows,
            marker,
            width = width
        );
    }
    println!();
    println!("Pending transactions: {}", result.pending_transactions);
}
