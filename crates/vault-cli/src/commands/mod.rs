//! Command implementations for vault-cli

pub mod status;
pub mod sync;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use vault_fs::LocalVault;
use vault_sync::{Collaborators, Coordinator, DefaultBackends, SyncSettings, TokioScheduler};

use crate::console::ConsoleSink;
use crate::error::Result;

pub use status::run_status;
pub use sync::{run_backup, run_commit, run_pull, run_push};
pub use watch::run_watch;

/// Build a coordinator for the vault at `root`.
pub fn open_vault(root: &Path, config: Option<&Path>) -> Result<Arc<Coordinator>> {
    let settings = match config {
        Some(path) => SyncSettings::load_file(path)?,
        None => SyncSettings::load(root)?,
    };
    tracing::debug!(vault = %root.display(), standalone = settings.standalone, "Opening vault");

    let vault = LocalVault::new(root)?;
    Ok(Coordinator::new(
        settings,
        Collaborators {
            backends: Arc::new(DefaultBackends::new(root)),
            vault: Arc::new(vault),
            sink: Arc::new(ConsoleSink),
            scheduler: Arc::new(TokioScheduler),
        },
    ))
}
