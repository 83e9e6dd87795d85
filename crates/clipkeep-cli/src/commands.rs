use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "clipkeep")]
#[command(about = "Retention and eviction for captured audio clips", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ./Config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a single retention pass
    Run {
        /// Report what would be deleted without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the deletion decision for the current inventory
    Plan {
        #[arg(long)]
        json: bool,
    },
    /// List the clip inventory and rejected entries
    Scan {
        #[arg(long)]
        json: bool,
    },
    /// Run passes on the configured interval until Enter is pressed
    Watch,
    /// Show the deletion audit log
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Export the entries to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Protect a clip from deletion
    Lock { path: String },
    /// Remove a reviewer lock
    Unlock { path: String },
    /// List reviewer locks
    Locks,
    /// Print configuration values
    PrintConfig,
}
