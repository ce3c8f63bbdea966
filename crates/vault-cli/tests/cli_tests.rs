//! End-to-end tests that invoke the compiled `vault-sync` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vault_test_utils::git::{RemotePair, has_git, write_file};

fn vault_sync_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vault-sync"))
}

fn run(vault: &Path, args: &[&str]) -> Output {
    Command::new(vault_sync_bin())
        .arg("--vault")
        .arg(vault)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute vault-sync binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

macro_rules! require_git {
    () => {
        if !has_git() {
            eprintln!("Skipping test: git not available");
            return;
        }
    };
}

#[test]
fn test_help_exits_zero() {
    let out = Command::new(vault_sync_bin()).arg("--help").output().unwrap();
    assert!(out.status.success());
    assert!(stdout(&out).contains("backup"));
}

#[test]
fn test_missing_vault_directory() {
    let temp = TempDir::new().unwrap();
    let out = run(&temp.path().join("missing"), &["pull"]);

    assert!(!out.status.success());
    assert!(stderr(&out).contains("is not a directory"));
}

#[test]
fn test_invalid_settings_file() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), ".vault-sync/config.toml", "auto_pull_interval = \"often\"\n");

    let out = run(temp.path(), &["pull"]);

    assert!(!out.status.success());
    assert!(stderr(&out).contains("Invalid settings"));
}

#[test]
fn test_status_outside_repository() {
    require_git!();
    let temp = TempDir::new().unwrap();

    let out = run(temp.path(), &["status"]);

    assert!(!out.status.success());
    assert!(stderr(&out).contains("Can't find a valid git repository"));
}

#[test]
fn test_backup_commits_and_pushes() {
    require_git!();
    let temp = TempDir::new().unwrap();
    let pair = RemotePair::new(temp.path());
    write_file(&pair.work, "journal.md", "entry\n");

    let out = run(&pair.work, &["backup", "-m", "journal entry"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let printed = stdout(&out);
    assert!(printed.contains("Committed 1 files"));
    assert!(printed.contains("Pushed 1 files to remote"));
}

#[test]
fn test_status_json() {
    require_git!();
    let temp = TempDir::new().unwrap();
    let pair = RemotePair::new(temp.path());
    write_file(&pair.work, "draft.md", "draft\n");

    let out = run(&pair.work, &["status", "--json"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["branch"], "main");
    assert_eq!(value["upstream"], "origin/main");
    assert_eq!(value["changed"], serde_json::json!(["draft.md"]));
}
