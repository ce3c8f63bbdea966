//! Conflict report written into the vault.

use std::sync::Arc;

use vault_fs::{Vault, VaultPath};

use crate::error::Result;

/// Vault-relative location of the conflict report.
pub const CONFLICT_REPORT_PATH: &str = "conflict-files-vault-sync.md";

const HEADER: &str = "# Conflicts\n\
Please resolve them and commit them using a manual backup followed by a push.\n\
(This file will automatically be deleted before commit)\n";

/// Writes, shows and clears the conflict report.
#[derive(Clone)]
pub struct ConflictReporter {
    vault: Arc<dyn Vault>,
    path: VaultPath,
}

impl ConflictReporter {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self {
            vault,
            path: VaultPath::new(CONFLICT_REPORT_PATH),
        }
    }

    pub fn path(&self) -> &VaultPath {
        &self.path
    }

    /// Render the report for the given conflicted paths.
    pub async fn render(&self, conflicted: &[VaultPath]) -> String {
        let mut content = String::from(HEADER);
        content.push('\n');
        for path in conflicted {
            match self.vault.link_text(path).await {
                Some(link) => content.push_str(&format!("- [[{link}]]\n")),
                None => content.push_str(&format!("- Not a file: {path}\n")),
            }
        }
        content
    }

    /// Overwrite the report and open it unless it is already displayed.
    pub async fn report(&self, conflicted: &[VaultPath]) -> Result<()> {
        let content = self.render(conflicted).await;
        self.vault.write(&self.path, &content).await?;
        tracing::debug!(path = %self.path, files = conflicted.len(), "Wrote conflict report");

        let already_open = self.vault.open_views().iter().any(|view| *view == self.path);
        if !already_open {
            self.vault.open(&self.path).await?;
        }
        Ok(())
    }

    /// Delete a stale report. A missing report is not an error.
    pub async fn clear(&self) -> Result<()> {
        match self.vault.delete(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path, "Removed stale conflict report");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for ConflictReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConflictReporter")
            .field("path", &self.path)
            .finish()
    }
}
