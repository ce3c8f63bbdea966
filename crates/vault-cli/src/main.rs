//! Vault Sync CLI
//!
//! Runs pull, backup, commit and push workflows against a git-backed vault
//! from the terminal.

mod cli;
mod commands;
mod console;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    match run() {
        Ok(()) => {}
        Err(CliError::Reported) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(cli))
}

fn init_tracing(verbose: bool) {
    let installed = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
        tracing::debug!("Verbose mode enabled");
        installed
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        true
    };
    if !installed {
        eprintln!("{}: could not install log subscriber", "warning".yellow().bold());
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let coordinator = commands::open_vault(&cli.vault, cli.config.as_deref())?;

    match cli.command {
        Commands::Pull => commands::run_pull(&coordinator).await,
        Commands::Backup { message } => commands::run_backup(&coordinator, message).await,
        Commands::Commit { message } => commands::run_commit(&coordinator, message).await,
        Commands::Push => commands::run_push(&coordinator).await,
        Commands::Status { json } => commands::run_status(&coordinator, &cli.vault, json).await,
        Commands::Watch => commands::run_watch(&coordinator, &cli.vault).await,
    }
}
