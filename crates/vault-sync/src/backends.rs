//! Backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use vault_git::{CliBackend, Git2Backend, Git2Options, GitBackend};

use crate::config::SyncSettings;

/// Chooses the backend the coordinator will drive.
pub trait BackendProvider: Send + Sync {
    fn select(&self, settings: &SyncSettings) -> Arc<dyn GitBackend>;
}

/// Picks [`Git2Backend`] in standalone mode and [`CliBackend`] otherwise.
#[derive(Debug, Clone)]
pub struct DefaultBackends {
    root: PathBuf,
}

impl DefaultBackends {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BackendProvider for DefaultBackends {
    fn select(&self, settings: &SyncSettings) -> Arc<dyn GitBackend> {
        if settings.standalone {
            let options = Git2Options {
                author_name: settings.in_process.author_name.clone(),
                author_email: settings.in_process.author_email.clone(),
                remote: settings.in_process.remote.clone(),
            };
            Arc::new(Git2Backend::new(&self.root, options))
        } else {
            Arc::new(CliBackend::new(&self.root, &settings.cli.git_path))
        }
    }
}

/// Always hands out the same backend.
#[derive(Clone)]
pub struct FixedBackend(pub Arc<dyn GitBackend>);

impl BackendProvider for FixedBackend {
    fn select(&self, _settings: &SyncSettings) -> Arc<dyn GitBackend> {
        Arc::clone(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_follows_standalone_flag() {
        let provider = DefaultBackends::new("/vault");

        let native = provider.select(&SyncSettings::default());
        assert_eq!(native.name(), "git-cli");
        assert!(native.supports_conflict_detection());

        let standalone = SyncSettings {
            standalone: true,
            ..Default::default()
        };
        let in_process = provider.select(&standalone);
        assert_eq!(in_process.name(), "libgit2");
        assert!(!in_process.supports_conflict_detection());
    }
}
