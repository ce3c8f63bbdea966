//! In-process driver built on libgit2

use std::path::PathBuf;

use async_trait::async_trait;
use git2::{
    BranchType, Commit, ErrorCode, IndexAddOption, Repository, Signature, Status, StatusOptions,
    Tree, build::CheckoutBuilder,
};
use vault_fs::VaultPath;

use crate::backend::{BranchInfo, GitBackend, Readiness, RepositoryStatus};
use crate::{Error, Result};

/// Settings for the in-process driver.
#[derive(Debug, Clone)]
pub struct Git2Options {
    /// Commit author name; falls back to the repository's `user.name`
    pub author_name: Option<String>,

    /// Commit author email; falls back to the repository's `user.email`
    pub author_email: Option<String>,

    /// Remote to fetch from and push to
    pub remote: String,
}

impl Default for Git2Options {
    fn default() -> Self {
        Self {
            author_name: None,
            author_email: None,
            remote: "origin".to_string(),
        }
    }
}

/// Backend running libgit2 on the blocking thread pool.
///
/// Pulls only fast-forward. A diverged branch fails the pull instead of
/// producing a merge, so this backend never leaves conflicts behind.
#[derive(Debug, Clone)]
pub struct Git2Backend {
    root: PathBuf,
    options: Git2Options,
}

impl Git2Backend {
    pub fn new(root: impl Into<PathBuf>, options: Git2Options) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// Open the repository on a blocking thread and run `op` against it.
    async fn with_repo<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Repository, &Git2Options) -> Result<T> + Send + 'static,
    {
        let root = self.root.clone();
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&root)?;
            op(&repo, &options)
        })
        .await
        .map_err(|e| Error::Join(e.to_string()))?
    }
}

#[async_trait]
impl GitBackend for Git2Backend {
    fn name(&self) -> &'static str {
        "libgit2"
    }

    fn supports_conflict_detection(&self) -> bool {
        false
    }

    async fn check_requirements(&self) -> Readiness {
        let root = self.root.clone();
        let options = self.options.clone();
        let result = tokio::task::spawn_blocking(move || {
            let Ok(repo) = Repository::open(&root) else {
                return Readiness::MissingRepo;
            };
            if signature(&repo, &options).is_err() {
                return Readiness::WrongSettings;
            }
            if repo.find_remote(&options.remote).is_err() {
                return Readiness::WrongSettings;
            }
            Readiness::Valid
        })
        .await;

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Requirement check did not complete");
            Readiness::MissingRepo
        })
    }

    async fn status(&self) -> Result<RepositoryStatus> {
        self.with_repo(|repo, _| status(repo)).await
    }

    async fn pull(&self) -> Result<usize> {
        self.with_repo(|repo, options| pull(repo, &options.remote))
            .await
    }

    async fn push(&self) -> Result<usize> {
        self.with_repo(|repo, options| push(repo, &options.remote))
            .await
    }

    async fn commit_all(&self, message: &str) -> Result<usize> {
        let message = message.to_string();
        self.with_repo(move |repo, options| {
            let sig = signature(repo, options)?;
            commit_all(repo, &sig, &message)
        })
        .await
    }

    async fn branch_info(&self) -> Result<BranchInfo> {
        self.with_repo(|repo, _| branch_info(repo)).await
    }

    async fn can_push(&self) -> Result<bool> {
        self.with_repo(|repo, _| {
            let branch = current_branch(repo)?;
            let local = repo.head()?.peel_to_commit()?;
            let upstream = upstream_commit(repo, &branch)?;
            let (ahead, _behind) = repo.graph_ahead_behind(local.id(), upstream.id())?;
            Ok(ahead > 0)
        })
        .await
    }
}

/// Build the commit signature from settings, falling back to git config.
fn signature(repo: &Repository, options: &Git2Options) -> Result<Signature<'static>> {
    match (&options.author_name, &options.author_email) {
        (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
            Ok(Signature::now(name, email)?)
        }
        _ => repo.signature().map_err(|_| Error::MissingAuthor),
    }
}

/// Name of the checked-out branch, also on an unborn branch.
pub fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.find_reference("HEAD")?;
    match head.symbolic_target() {
        Some(target) => Ok(target
            .strip_prefix("refs/heads/")
            .unwrap_or(target)
            .to_string()),
        None => Err(Error::DetachedHead),
    }
}

fn upstream_commit<'r>(repo: &'r Repository, branch: &str) -> Result<Commit<'r>> {
    let local = repo.find_branch(branch, BranchType::Local)?;
    let upstream = local.upstream().map_err(|_| Error::NoUpstream {
        branch: branch.to_string(),
    })?;
    Ok(upstream.get().peel_to_commit()?)
}

fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree()?)),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn count_changes(repo: &Repository, old: Option<&Tree<'_>>, new: Option<&Tree<'_>>) -> Result<usize> {
    let diff = repo.diff_tree_to_tree(old, new, None)?;
    Ok(diff.deltas().len())
}

fn status(repo: &Repository) -> Result<RepositoryStatus> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);

    let mut result = RepositoryStatus::default();
    for entry in repo.statuses(Some(&mut opts))?.iter() {
        let Some(path) = entry.path() else {
            continue;
        };
        let flags = entry.status();
        if flags == Status::CURRENT || flags.is_ignored() {
            continue;
        }
        let path = VaultPath::new(path);
        if flags.is_conflicted() {
            result.conflicted.push(path.clone());
        }
        result.changed.push(path);
    }
    Ok(result)
}

/// Fetch and fast-forward the current branch onto its upstream.
///
/// The new tree is checked out before any ref moves, so an uncommitted
/// edit that the incoming commits would overwrite fails the pull and
/// leaves HEAD where it was.
fn pull(repo: &Repository, remote_name: &str) -> Result<usize> {
    let branch = current_branch(repo)?;

    let mut remote = repo.find_remote(remote_name)?;
    remote.fetch(&[] as &[&str], None, None)?;

    let target = upstream_commit(repo, &branch)?;
    let incoming = repo.find_annotated_commit(target.id())?;
    let (analysis, _) = repo.merge_analysis(&[&incoming])?;

    if analysis.is_up_to_date() {
        return Ok(0);
    }
    if !analysis.is_fast_forward() {
        return Err(Error::CannotFastForward {
            message: format!(
                "{} has diverged from {}/{}; merge manually",
                branch, remote_name, branch
            ),
        });
    }

    let old_tree = head_tree(repo)?;
    let new_tree = target.tree()?;
    repo.checkout_tree(new_tree.as_object(), Some(CheckoutBuilder::new().safe()))?;

    let refname = format!("refs/heads/{}", branch);
    repo.find_reference(&refname)?
        .set_target(target.id(), &format!("pull: fast-forward to {}", target.id()))?;
    repo.set_head(&refname)?;

    let files = count_changes(repo, old_tree.as_ref(), Some(&new_tree))?;
    tracing::debug!(%branch, files, "Fast-forwarded");
    Ok(files)
}

fn push(repo: &Repository, remote_name: &str) -> Result<usize> {
    let branch = current_branch(repo)?;
    let local_tree = repo.head()?.peel_to_tree()?;
    let upstream_tree = upstream_commit(repo, &branch)?.tree()?;
    let files = count_changes(repo, Some(&upstream_tree), Some(&local_tree))?;

    let mut remote = repo.find_remote(remote_name)?;
    let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
    remote.push(&[&refspec], None)?;

    Ok(files)
}

fn commit_all(repo: &Repository, sig: &Signature<'_>, message: &str) -> Result<usize> {
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;

    let tree = repo.find_tree(index.write_tree()?)?;
    let parent_tree = head_tree(repo)?;
    let files = count_changes(repo, parent_tree.as_ref(), Some(&tree))?;
    if files == 0 {
        return Ok(0);
    }

    let parent = match parent_tree {
        Some(_) => Some(repo.head()?.peel_to_commit()?),
        None => None,
    };
    let parents: Vec<&Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), sig, sig, message, &tree, &parents)?;

    Ok(files)
}

fn branch_info(repo: &Repository) -> Result<BranchInfo> {
    let current = current_branch(repo)?;
    let remote = repo
        .branch_upstream_name(&format!("refs/heads/{}", current))
        .ok()
        .and_then(|buf| buf.as_str().map(str::to_string))
        .map(|name| {
            name.strip_prefix("refs/remotes/")
                .map(str::to_string)
                .unwrap_or(name)
        });
    Ok(BranchInfo { current, remote })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_current_branch_on_unborn_repo() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let branch = current_branch(&repo).unwrap();
        assert!(!branch.is_empty());
        assert!(!branch.starts_with("refs/"));
    }

    #[test]
    fn test_head_tree_is_none_before_first_commit() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        assert!(head_tree(&repo).unwrap().is_none());
    }

    #[test]
    fn test_signature_prefers_options() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let options = Git2Options {
            author_name: Some("Vault Bot".into()),
            author_email: Some("bot@example.com".into()),
            ..Default::default()
        };

        let sig = signature(&repo, &options).unwrap();
        assert_eq!(sig.name(), Some("Vault Bot"));
        assert_eq!(sig.email(), Some("bot@example.com"));
    }

    #[test]
    fn test_backend_does_not_detect_conflicts() {
        let backend = Git2Backend::new("/tmp", Git2Options::default());
        assert!(!backend.supports_conflict_detection());
    }
}
