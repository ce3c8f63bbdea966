//! Pull, backup and push workflows.
//!
//! Each workflow is a fixed sequence of backend calls. Conflicts are a
//! regular outcome, not an error: they stop the workflow and leave the
//! coordinator in [`CoordinatorState::Conflicted`].

use std::sync::Arc;

use chrono::Local;
use vault_fs::VaultPath;
use vault_git::{BranchInfo, GitBackend, RepositoryStatus};

use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::state::CoordinatorState;

/// Who asked for a backup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trigger {
    /// The user; commits even over conflicts
    #[default]
    Manual,
    /// A timer; never commits over conflicts
    Automatic,
}

/// Parameters of a backup workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupRequest {
    pub trigger: Trigger,
    /// Used verbatim instead of the configured template
    pub message: Option<String>,
    /// Stop after the commit step
    pub commit_only: bool,
}

impl BackupRequest {
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn automatic() -> Self {
        Self {
            trigger: Trigger::Automatic,
            ..Self::default()
        }
    }

    /// A manual commit without the push phase.
    pub fn commit(message: Option<String>) -> Self {
        Self {
            message,
            commit_only: true,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    NotReady,
    UpToDate,
    Pulled { files: usize },
    /// The pull left unresolved conflicts behind
    Conflicted { files: usize, conflicts: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    NotReady,
    /// Pushing is turned off in the settings
    Disabled,
    NoUpstream,
    NothingToPush,
    Conflicted { conflicts: usize },
    Pushed { files: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    NotReady,
    /// An automatic backup found conflicts and committed nothing
    Conflicted { conflicts: usize },
    /// `push` is `None` for commit-only requests
    Completed {
        committed: usize,
        push: Option<PushOutcome>,
    },
}

/// Snapshot of the repository for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub backend: &'static str,
    pub branch: BranchInfo,
    pub status: RepositoryStatus,
}

impl Coordinator {
    pub(crate) async fn pull_workflow(self: &Arc<Self>) -> Result<PullOutcome> {
        let Some(backend) = self.ensure_ready().await else {
            return Ok(PullOutcome::NotReady);
        };

        let files = self.pull_changes(&backend).await?;
        if files == 0 {
            self.notifier.message("Everything is up-to-date");
        }

        if backend.supports_conflict_detection() {
            let status = self.check_status(&backend).await?;
            if status.has_conflicts() {
                let conflicts = status.conflicted.len();
                self.notifier
                    .error(format!("You have {conflicts} conflict files"));
                self.state.set(CoordinatorState::Conflicted);
                return Ok(PullOutcome::Conflicted { files, conflicts });
            }
        }

        self.state.set(CoordinatorState::Idle);
        Ok(match files {
            0 => PullOutcome::UpToDate,
            files => PullOutcome::Pulled { files },
        })
    }

    pub(crate) async fn backup_workflow(
        self: &Arc<Self>,
        request: BackupRequest,
    ) -> Result<BackupOutcome> {
        let Some(backend) = self.ensure_ready().await else {
            return Ok(BackupOutcome::NotReady);
        };
        let automatic = request.trigger == Trigger::Automatic;

        if !automatic {
            self.clear_report().await;
        }

        if backend.supports_conflict_detection() {
            let status = self.check_status(&backend).await?;
            if automatic && status.has_conflicts() {
                let conflicts = status.conflicted.len();
                self.notifier.error(format!(
                    "Did not commit, because you have {conflicts} conflict files. \
                     Please resolve them and commit per command."
                ));
                self.escalate_conflicts(&status.conflicted).await;
                return Ok(BackupOutcome::Conflicted { conflicts });
            }
        }

        let status = self.check_status(&backend).await?;
        let committed = if status.is_clean() {
            self.notifier.message("No changes to commit");
            0
        } else {
            let message = match request.message {
                Some(message) => message,
                None => self
                    .settings
                    .format_commit_message(&status.changed, &Local::now()),
            };
            self.state.set(CoordinatorState::Committing);
            let committed = backend.commit_all(&message).await?;
            self.notifier.message(format!("Committed {committed} files"));
            committed
        };
        self.state.set(CoordinatorState::Idle);

        if request.commit_only {
            return Ok(BackupOutcome::Completed {
                committed,
                push: None,
            });
        }
        let push = if self.settings.disable_push {
            PushOutcome::Disabled
        } else {
            self.push_phase(&backend).await?
        };
        Ok(BackupOutcome::Completed {
            committed,
            push: Some(push),
        })
    }

    pub(crate) async fn push_workflow(self: &Arc<Self>) -> Result<PushOutcome> {
        match self.ensure_ready().await {
            Some(backend) => self.push_phase(&backend).await,
            None => Ok(PushOutcome::NotReady),
        }
    }

    pub(crate) async fn inspect_workflow(self: &Arc<Self>) -> Result<Option<Inspection>> {
        let Some(backend) = self.ensure_ready().await else {
            return Ok(None);
        };
        let rest = self.state();
        self.state.set(CoordinatorState::CheckingStatus);
        let queried = async {
            let branch = backend.branch_info().await?;
            let status = backend.status().await?;
            Ok::<_, Error>((branch, status))
        }
        .await;
        self.state.set(rest);
        let (branch, status) = queried?;
        Ok(Some(Inspection {
            backend: backend.name(),
            branch,
            status,
        }))
    }

    async fn push_phase(&self, backend: &Arc<dyn GitBackend>) -> Result<PushOutcome> {
        self.state.set(CoordinatorState::CheckingStatus);
        let branch = backend.branch_info().await?;
        if branch.remote.is_none() {
            self.notifier
                .error("Did not push. No upstream branch is set!");
            self.state.set(CoordinatorState::Idle);
            return Ok(PushOutcome::NoUpstream);
        }

        if !backend.can_push().await? {
            self.notifier.message("No changes to push");
            self.state.set(CoordinatorState::Idle);
            return Ok(PushOutcome::NothingToPush);
        }

        if self.settings.pull_before_push {
            self.pull_changes(backend).await?;
        }

        if backend.supports_conflict_detection() {
            let status = self.check_status(backend).await?;
            if status.has_conflicts() {
                let conflicts = status.conflicted.len();
                self.notifier
                    .error(format!("Cannot push. You have {conflicts} conflict files"));
                self.escalate_conflicts(&status.conflicted).await;
                return Ok(PushOutcome::Conflicted { conflicts });
            }
        }

        self.state.set(CoordinatorState::Pushing);
        let files = backend.push().await?;
        self.notifier
            .message(format!("Pushed {files} files to remote"));
        self.state.set(CoordinatorState::Idle);
        Ok(PushOutcome::Pushed { files })
    }

    async fn pull_changes(&self, backend: &Arc<dyn GitBackend>) -> Result<usize> {
        self.state.set(CoordinatorState::Pulling);
        let files = backend.pull().await?;
        if files > 0 {
            self.notifier
                .message(format!("Pulled {files} files from remote"));
        }
        Ok(files)
    }

    async fn check_status(&self, backend: &Arc<dyn GitBackend>) -> Result<RepositoryStatus> {
        self.state.set(CoordinatorState::CheckingStatus);
        Ok(backend.status().await?)
    }

    async fn escalate_conflicts(&self, conflicted: &[VaultPath]) {
        self.state.set(CoordinatorState::Conflicted);
        if let Err(e) = self.reporter.report(conflicted).await {
            tracing::warn!(error = %e, "Could not write conflict report");
            self.notifier
                .error(format!("Could not write conflict report: {e}"));
        }
    }

    async fn clear_report(&self) {
        if let Err(e) = self.reporter.clear().await {
            tracing::warn!(error = %e, "Could not remove stale conflict report");
        }
    }
}
