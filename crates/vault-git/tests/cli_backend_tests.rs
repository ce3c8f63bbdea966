//! Tests against the real `git` executable. Each test returns early when
//! git is not installed.

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vault_fs::VaultPath;
use vault_git::{CliBackend, GitBackend, Readiness};
use vault_test_utils::git::{RemotePair, commit_all, has_git, seeded_repo, run_git, write_file};

macro_rules! require_git {
    () => {
        if !has_git() {
            eprintln!("Skipping test: git not available");
            return;
        }
    };
}

#[tokio::test]
async fn test_requirements_outside_repository() {
    require_git!();
    let temp = TempDir::new().unwrap();
    let backend = CliBackend::new(temp.path(), "git");
    assert_eq!(backend.check_requirements().await, Readiness::MissingRepo);
}

#[tokio::test]
async fn test_requirements_with_missing_root() {
    require_git!();
    let temp = TempDir::new().unwrap();
    let backend = CliBackend::new(temp.path().join("missing"), "git");
    assert_eq!(backend.check_requirements().await, Readiness::WrongSettings);
}

#[tokio::test]
async fn test_requirements_valid() {
    require_git!();
    let temp = TempDir::new().unwrap();
    seeded_repo(temp.path());
    let backend = CliBackend::new(temp.path(), "git");
    assert_eq!(backend.check_requirements().await, Readiness::Valid);
}

#[tokio::test]
async fn test_branch_info_without_upstream() {
    require_git!();
    let temp = TempDir::new().unwrap();
    seeded_repo(temp.path());
    let backend = CliBackend::new(temp.path(), "git");

    let info = backend.branch_info().await.unwrap();

    assert_eq!(info.current, "main");
    assert_eq!(info.remote, None);
}

#[tokio::test]
async fn test_commit_then_push_round() {
    require_git!();
    let temp = TempDir::new().unwrap();
    let pair = RemotePair::new(temp.path());
    let backend = CliBackend::new(&pair.work, "git");

    let info = backend.branch_info().await.unwrap();
    assert_eq!(info.remote.as_deref(), Some("origin/main"));
    assert!(!backend.can_push().await.unwrap());

    write_file(&pair.work, "notes/a.md", "a");
    let status = backend.status().await.unwrap();
    assert_eq!(status.changed, vec![VaultPath::new("notes/a.md")]);

    assert_eq!(backend.commit_all("vault backup").await.unwrap(), 1);
    assert!(backend.status().await.unwrap().is_clean());
    assert!(backend.can_push().await.unwrap());

    assert_eq!(backend.push().await.unwrap(), 1);
    assert!(!backend.can_push().await.unwrap());
}

#[tokio::test]
async fn test_pull_counts_updated_files() {
    require_git!();
    let temp = TempDir::new().unwrap();
    let pair = RemotePair::new(temp.path());
    let other = pair.clone_into(temp.path(), "other");
    write_file(&other, "a.md", "a");
    write_file(&other, "b.md", "b");
    commit_all(&other, "from elsewhere");
    run_git(&other, &["push"]);

    let backend = CliBackend::new(&pair.work, "git");

    assert_eq!(backend.pull().await.unwrap(), 2);
    assert_eq!(backend.pull().await.unwrap(), 0);
}

#[tokio::test]
async fn test_conflicting_pull_reports_through_status() {
    require_git!();
    let temp = TempDir::new().unwrap();
    let pair = RemotePair::new(temp.path());
    let other = pair.clone_into(temp.path(), "other");
    write_file(&other, "README.md", "theirs\n");
    commit_all(&other, "their edit");
    run_git(&other, &["push"]);

    write_file(&pair.work, "README.md", "ours\n");
    commit_all(&pair.work, "our edit");

    let backend = CliBackend::new(&pair.work, "git");
    assert_eq!(backend.pull().await.unwrap(), 0);

    let status = backend.status().await.unwrap();
    assert_eq!(status.conflicted, vec![VaultPath::new("README.md")]);
}

#[tokio::test]
async fn test_pull_without_remote_fails() {
    require_git!();
    let temp = TempDir::new().unwrap();
    seeded_repo(temp.path());
    let backend = CliBackend::new(temp.path(), "git");

    assert!(backend.pull().await.is_err());
}
