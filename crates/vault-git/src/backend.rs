//! Backend capability interface

use async_trait::async_trait;
use vault_fs::VaultPath;

use crate::Result;

/// Snapshot of the working tree as reported by a backend.
///
/// Always queried fresh; the backend may change between two calls of the
/// same workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStatus {
    /// Files with uncommitted modifications (including untracked files)
    pub changed: Vec<VaultPath>,

    /// Files with unresolved merge conflicts
    pub conflicted: Vec<VaultPath>,
}

impl RepositoryStatus {
    /// Whether the working tree has nothing to commit.
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty()
    }

    /// Whether unresolved conflicts are present.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicted.is_empty()
    }
}

/// Current branch and its upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    /// Checked-out branch name
    pub current: String,

    /// Remote-tracking branch (e.g. `origin/main`), `None` when no upstream is set
    pub remote: Option<String>,
}

/// Outcome of a backend's environment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Valid,
    MissingGit,
    MissingRepo,
    WrongSettings,
}

impl Readiness {
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Capabilities a version-control driver offers to the sync coordinator.
///
/// Every method may be slow and may fail; callers serialize access so
/// implementations never see two calls in flight at once.
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether [`status`](Self::status) reports merge conflicts this
    /// backend can produce.
    fn supports_conflict_detection(&self) -> bool;

    /// Check that the tool, the repository and the settings are usable.
    async fn check_requirements(&self) -> Readiness;

    async fn status(&self) -> Result<RepositoryStatus>;

    /// Pull from the upstream branch, returning the number of files updated.
    async fn pull(&self) -> Result<usize>;

    /// Push to the upstream branch, returning the number of files pushed.
    async fn push(&self) -> Result<usize>;

    /// Stage every change and commit it, returning the number of files committed.
    async fn commit_all(&self, message: &str) -> Result<usize>;

    async fn branch_info(&self) -> Result<BranchInfo>;

    /// Whether local commits are ahead of the upstream branch.
    async fn can_push(&self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        let status = RepositoryStatus {
            changed: vec![VaultPath::new("a.md")],
            conflicted: vec![],
        };
        assert!(!status.is_clean());
        assert!(!status.has_conflicts());
        assert!(RepositoryStatus::default().is_clean());
    }

    #[test]
    fn test_backend_is_object_safe() {
        fn assert_object_safe(_: Option<&dyn GitBackend>) {}
        assert_object_safe(None);
    }
}
