//! CLI argument definitions using clap
//!
//! Commands:
//! - rankkeeper init --config <path>
//! - rankkeeper insert --config <path> [--scope <key>] [--payload <json>]
//! - rankkeeper delete --config <path> --id <id> [--scope <key>]
//! - rankkeeper move-up --config <path> --id <id> [--scope <key>]
//! - rankkeeper move-down --config <path> --id <id> [--scope <key>]
//! - rankkeeper list --config <path> [--scope <key>] [--limit <n>]
//! - rankkeeper verify --config <path> [--scope <key>]
//! - rankkeeper repair --config <path> [--scope <key>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rankkeeper - dense ordering column maintenance
#[derive(Parser, Debug)]
#[command(name = "rankkeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and record table
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
    },

    /// Append a record at the end of its scope
    Insert {
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
        /// Scope key; omitted means the whole table
        #[arg(long, default_value = "")]
        scope: String,
        /// JSON payload stored with the record
        #[arg(long, default_value = "{}")]
        payload: String,
        /// Record id; generated if omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a record and close the gap it leaves
    Delete {
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        scope: String,
    },

    /// Move a record one rank toward the top
    MoveUp {
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        scope: String,
    },

    /// Move a record one rank toward the bottom
    MoveDown {
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        scope: String,
    },

    /// List a scope in rank order
    List {
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
        #[arg(long, default_value = "")]
        scope: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Check that a scope is dense
    Verify {
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
        #[arg(long, default_value = "")]
        scope: String,
    },

    /// Restore a scope to 1..N after an interrupted move
    Repair {
        #[arg(long, default_value = "./rankkeeper.json")]
        config: PathBuf,
        #[arg(long, default_value = "")]
        scope: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
