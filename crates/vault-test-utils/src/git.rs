//! Git repository fixtures.
//!
//! [`init_repo`] needs only libgit2. Everything else shells out to `git`,
//! so callers should skip when [`has_git`] is false.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const IDENTITY: [(&str, &str); 3] = [
    ("user.name", "Test User"),
    ("user.email", "test@test.com"),
    ("commit.gpgsign", "false"),
];

pub fn has_git() -> bool {
    matches!(
        Command::new("git").arg("--version").output(),
        Ok(out) if out.status.success()
    )
}

/// Empty repository created through libgit2.
pub fn init_repo(dir: &Path) -> git2::Repository {
    match git2::Repository::init(dir) {
        Ok(repo) => repo,
        Err(e) => panic!("cannot init {}: {e}", dir.display()),
    }
}

/// Run `git` in `dir` and return its stdout. Panics with stderr on failure.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("git {} could not start: {e}", args.join(" ")));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        out.status.success(),
        "git {} in {}: {stderr}",
        args.join(" "),
        dir.display()
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn set_identity(dir: &Path) {
    for (key, value) in IDENTITY {
        run_git(dir, &["config", key, value]);
    }
}

/// Repository on `main` holding a single commit of `README.md`.
pub fn seeded_repo(dir: &Path) {
    run_git(dir, &["init", "--initial-branch=main"]);
    set_identity(dir);
    write_file(dir, "README.md", "# Test\n");
    commit_all(dir, "Initial commit");
}

/// A bare remote and a working clone that tracks it.
pub struct RemotePair {
    pub remote: PathBuf,
    /// `main` here tracks `origin/main`
    pub work: PathBuf,
}

impl RemotePair {
    pub fn new(root: &Path) -> Self {
        let pair = Self {
            remote: root.join("remote.git"),
            work: root.join("work"),
        };
        for dir in [&pair.remote, &pair.work] {
            fs::create_dir_all(dir).unwrap_or_else(|e| panic!("{}: {e}", dir.display()));
        }

        run_git(&pair.remote, &["init", "--bare", "--initial-branch=main"]);
        seeded_repo(&pair.work);
        run_git(&pair.work, &["remote", "add", "origin", &pair.remote_url()]);
        run_git(&pair.work, &["push", "--set-upstream", "origin", "main"]);
        pair
    }

    fn remote_url(&self) -> String {
        self.remote.display().to_string()
    }

    /// Second working copy at `root/<name>` with an identity configured.
    pub fn clone_into(&self, root: &Path, name: &str) -> PathBuf {
        let dest = root.join(name);
        run_git(root, &["clone", &self.remote_url(), name]);
        set_identity(&dest);
        dest
    }
}

/// Write `content` at `relative` under `dir`, creating directories on the way.
pub fn write_file(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| panic!("{}: {e}", parent.display()));
    }
    fs::write(&path, content).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
}

pub fn commit_all(dir: &Path, message: &str) {
    run_git(dir, &["add", "--all"]);
    run_git(dir, &["commit", "--quiet", "-m", message]);
}
