//! Watch command: keep the periodic triggers running

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use vault_sync::{Coordinator, CoordinatorState};

use crate::error::{CliError, Result};

pub async fn run_watch(coordinator: &Arc<Coordinator>, vault: &Path) -> Result<()> {
    if !coordinator.initialize().await?.is_valid() {
        return Err(CliError::Reported);
    }

    let settings = coordinator.settings();
    if settings.auto_backup_period().is_none() && settings.auto_pull_period().is_none() {
        println!(
            "{} no automatic backup or pull interval is configured",
            "warning:".yellow().bold()
        );
    }
    println!(
        "Watching {} ({} to stop)",
        vault.display().to_string().cyan(),
        "Ctrl-C".bold()
    );

    tokio::signal::ctrl_c().await?;

    tracing::debug!("Interrupted, finishing queued work");
    coordinator.disarm();
    if let Some(notice) = shutdown_notice(coordinator.state()) {
        println!("{}", notice.dimmed());
    }
    coordinator.flush().await;
    Ok(())
}

/// Line printed on interrupt while a backend call is still running.
fn shutdown_notice(state: CoordinatorState) -> Option<String> {
    state
        .is_busy()
        .then(|| format!("Waiting for {} to finish...", state))
}
