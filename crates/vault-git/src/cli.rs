//! Native `git` command-line driver

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::backend::{BranchInfo, GitBackend, Readiness, RepositoryStatus};
use crate::{Error, Result, porcelain};

/// Backend driving the `git` executable found at `git_path`.
///
/// Credentials come from whatever helper the user's git is configured
/// with; terminal prompts are disabled so a missing credential fails the
/// call instead of hanging the queue.
#[derive(Debug, Clone)]
pub struct CliBackend {
    root: PathBuf,
    git: PathBuf,
}

impl CliBackend {
    pub fn new(root: impl Into<PathBuf>, git_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            git: git_path.into(),
        }
    }

    /// Working tree this backend operates on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run git and return stdout, failing on a non-zero exit.
    async fn git(&self, args: &[&str]) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(%command, root = %self.root.display(), "Running git");

        let output = self
            .command(args)
            .output()
            .await
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CommandFailed {
                command,
                message: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn succeeds(&self, args: &[&str]) -> bool {
        self.command(args)
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Number of non-empty lines printed by a git command.
    async fn count_lines(&self, args: &[&str]) -> Result<usize> {
        let out = self.git(args).await?;
        Ok(out.lines().filter(|l| !l.trim().is_empty()).count())
    }

    async fn head(&self) -> Option<String> {
        self.git(&["rev-parse", "--verify", "HEAD"])
            .await
            .ok()
            .map(|s| s.trim().to_string())
    }

    async fn upstream(&self) -> Option<String> {
        self.git(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])
            .await
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    async fn require_upstream(&self) -> Result<String> {
        match self.upstream().await {
            Some(upstream) => Ok(upstream),
            None => Err(Error::NoUpstream {
                branch: self.branch_info().await?.current,
            }),
        }
    }
}

#[async_trait]
impl GitBackend for CliBackend {
    fn name(&self) -> &'static str {
        "git-cli"
    }

    fn supports_conflict_detection(&self) -> bool {
        true
    }

    async fn check_requirements(&self) -> Readiness {
        let git_runs = Command::new(&self.git)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);
        if !git_runs {
            return Readiness::MissingGit;
        }

        if !self.root.is_dir() {
            return Readiness::WrongSettings;
        }

        if !self.succeeds(&["rev-parse", "--is-inside-work-tree"]).await {
            return Readiness::MissingRepo;
        }

        Readiness::Valid
    }

    async fn status(&self) -> Result<RepositoryStatus> {
        let out = self
            .git(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .await?;
        Ok(porcelain::parse_status(&out))
    }

    async fn pull(&self) -> Result<usize> {
        let before = self.head().await;

        if let Err(e) = self.git(&["pull", "--no-rebase"]).await {
            // A merge that stops on conflicts is reported through status
            let unmerged = self
                .count_lines(&["diff", "--name-only", "--diff-filter=U"])
                .await
                .unwrap_or(0);
            if unmerged == 0 {
                return Err(e);
            }
            tracing::warn!(files = unmerged, "Pull stopped on merge conflicts");
        }

        let after = self.head().await;
        match (before, after) {
            (_, None) => Ok(0),
            (Some(before), Some(after)) if before == after => Ok(0),
            (Some(before), Some(after)) => {
                self.count_lines(&["diff", "--name-only", &before, &after])
                    .await
            }
            (None, Some(_)) => self.count_lines(&["ls-files"]).await,
        }
    }

    async fn push(&self) -> Result<usize> {
        let upstream = self.require_upstream().await?;
        let files = self
            .count_lines(&["diff", "--name-only", &upstream, "HEAD"])
            .await?;
        self.git(&["push"]).await?;
        Ok(files)
    }

    async fn commit_all(&self, message: &str) -> Result<usize> {
        self.git(&["add", "-A"]).await?;
        let staged = self.count_lines(&["diff", "--cached", "--name-only"]).await?;
        if staged == 0 {
            return Ok(0);
        }
        self.git(&["commit", "-m", message]).await?;
        Ok(staged)
    }

    async fn branch_info(&self) -> Result<BranchInfo> {
        // symbolic-ref also works on an unborn branch, rev-parse does not
        let current = match self.git(&["symbolic-ref", "--short", "HEAD"]).await {
            Ok(name) => name.trim().to_string(),
            Err(_) => return Err(Error::DetachedHead),
        };
        Ok(BranchInfo {
            current,
            remote: self.upstream().await,
        })
    }

    async fn can_push(&self) -> Result<bool> {
        let upstream = self.require_upstream().await?;
        let range = format!("{upstream}..HEAD");
        let out = self.git(&["rev-list", "--count", &range]).await?;
        let ahead: usize = out
            .trim()
            .parse()
            .map_err(|_| Error::UnexpectedOutput {
                command: format!("git rev-list --count {range}"),
                output: out.trim().to_string(),
            })?;
        Ok(ahead > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CliBackend>();
    }

    #[test]
    fn test_supports_conflict_detection() {
        let backend = CliBackend::new("/tmp", "git");
        assert!(backend.supports_conflict_detection());
        assert_eq!(backend.name(), "git-cli");
    }

    #[tokio::test]
    async fn test_missing_executable_is_missing_git() {
        let temp = TempDir::new().unwrap();
        let backend = CliBackend::new(temp.path(), temp.path().join("no-such-git"));
        assert_eq!(backend.check_requirements().await, Readiness::MissingGit);
    }
}
