//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vault Sync - keep a git-backed vault in step with its remote
#[derive(Parser, Debug)]
#[command(name = "vault-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Vault directory
    #[arg(long, global = true, env = "VAULT_SYNC_DIR", default_value = ".")]
    pub vault: PathBuf,

    /// Settings file (defaults to .vault-sync/config.toml inside the vault)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Pull remote changes
    Pull,

    /// Commit every change, then push
    Backup {
        /// Commit message (defaults to the configured template)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Commit every change without pushing
    Commit {
        /// Commit message (defaults to the configured template)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Push committed changes
    Push,

    /// Show branch, upstream and working-tree status
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Run the automatic backup and pull timers until interrupted
    Watch,
}
