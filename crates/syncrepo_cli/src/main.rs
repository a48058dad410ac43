//! syncrepo CLI
//!
//! Command-line tools for syncrepo local databases.
//!
//! # Commands
//!
//! - `inspect` - List tables and row counts
//! - `dump-log` - Print pending transaction log entries in replay order
//! - `clear-log` - Drop pending log entries for an entity type
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// syncrepo command-line database tools.
#[derive(Parser)]
#[command(name = "syncrepo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory holding the databases
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Database name
    #[arg(global = true, long, default_value = "RepositoryDemo")]
    db: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables and row counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print pending log entries in replay order
    DumpLog {
        /// Entity type whose log to dump
        #[arg(short, long)]
        entity: String,

        /// Maximum number of entries to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Drop every pending log entry for an entity type
    ClearLog {
        /// Entity type whose log to clear
        #[arg(short, long)]
        entity: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&path, &cli.db, &format)?;
        }
        Commands::DumpLog {
            entity,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Database path required for dump-log")?;
            commands::dump_log::run(&path, &cli.db, &entity, limit, &format)?;
        }
        Commands::ClearLog { entity } => {
            let path = cli.path.ok_or("Database path required for clear-log")?;
            commands::clear_log::run(&path, &cli.db, &entity)?;
        }
        Commands::Version => {
            println!("syncrepo CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("syncrepo Core v{}", syncrepo_core::VERSION);
        }
    }

    Ok(())
}
