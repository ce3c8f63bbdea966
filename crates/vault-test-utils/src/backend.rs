//! Scripted [`GitBackend`] that records every call.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vault_fs::VaultPath;
use vault_git::{BranchInfo, Error, GitBackend, Readiness, RepositoryStatus, Result};

/// A backend call as seen by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckRequirements,
    Status,
    Pull,
    Push,
    CommitAll(String),
    BranchInfo,
    CanPush,
}

#[derive(Debug)]
struct Script {
    readiness: VecDeque<Readiness>,
    default_readiness: Readiness,
    statuses: VecDeque<RepositoryStatus>,
    default_status: RepositoryStatus,
    pulls: VecDeque<std::result::Result<usize, String>>,
    push: std::result::Result<usize, String>,
    commit_error: Option<String>,
    branch: BranchInfo,
    branch_error: Option<String>,
    can_push: bool,
}

/// A backend whose answers are scripted up front.
///
/// `status()` pops queued snapshots first and then keeps returning the
/// default one; `commit_all` returns the number of changed files in the
/// most recent snapshot. An optional delay is inserted before every call
/// so tests can observe overlapping execution.
#[derive(Debug)]
pub struct FakeBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    last_status: Mutex<RepositoryStatus>,
    conflict_detection: bool,
    delay: Option<Duration>,
    in_flight: Mutex<(usize, usize)>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// A ready backend with a clean tree, branch `main` tracking `origin/main`.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                readiness: VecDeque::new(),
                default_readiness: Readiness::Valid,
                statuses: VecDeque::new(),
                default_status: RepositoryStatus::default(),
                pulls: VecDeque::new(),
                push: Ok(0),
                commit_error: None,
                branch: BranchInfo {
                    current: "main".to_string(),
                    remote: Some("origin/main".to_string()),
                },
                branch_error: None,
                can_push: false,
            }),
            calls: Mutex::new(Vec::new()),
            last_status: Mutex::new(RepositoryStatus::default()),
            conflict_detection: true,
            delay: None,
            in_flight: Mutex::new((0, 0)),
        }
    }

    pub fn with_readiness(self, readiness: Readiness) -> Self {
        self.script.lock().unwrap().default_readiness = readiness;
        self
    }

    /// Answer the next requirement check with `readiness`, then fall back
    /// to the default.
    pub fn then_readiness(self, readiness: Readiness) -> Self {
        self.script.lock().unwrap().readiness.push_back(readiness);
        self
    }

    /// Default working-tree snapshot.
    pub fn with_status(self, changed: &[&str], conflicted: &[&str]) -> Self {
        self.script.lock().unwrap().default_status = snapshot(changed, conflicted);
        self
    }

    /// Snapshot returned by the next otherwise unscripted `status()` call.
    pub fn then_status(self, changed: &[&str], conflicted: &[&str]) -> Self {
        self.queue_status(changed, conflicted);
        self
    }

    /// Queue a snapshot on a shared backend.
    pub fn queue_status(&self, changed: &[&str], conflicted: &[&str]) {
        self.script
            .lock()
            .unwrap()
            .statuses
            .push_back(snapshot(changed, conflicted));
    }

    /// Files updated by the next pull. Unscripted pulls update nothing.
    pub fn with_pull(self, files: usize) -> Self {
        self.script.lock().unwrap().pulls.push_back(Ok(files));
        self
    }

    pub fn with_pull_error(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .pulls
            .push_back(Err(message.to_string()));
        self
    }

    pub fn with_push(self, files: usize) -> Self {
        self.script.lock().unwrap().push = Ok(files);
        self
    }

    pub fn with_push_error(self, message: &str) -> Self {
        self.script.lock().unwrap().push = Err(message.to_string());
        self
    }

    pub fn with_commit_error(self, message: &str) -> Self {
        self.script.lock().unwrap().commit_error = Some(message.to_string());
        self
    }

    pub fn with_branch(self, current: &str, remote: Option<&str>) -> Self {
        self.script.lock().unwrap().branch = BranchInfo {
            current: current.to_string(),
            remote: remote.map(str::to_string),
        };
        self
    }

    pub fn with_branch_error(self, message: &str) -> Self {
        self.script.lock().unwrap().branch_error = Some(message.to_string());
        self
    }

    pub fn with_can_push(self, can_push: bool) -> Self {
        self.script.lock().unwrap().can_push = can_push;
        self
    }

    pub fn without_conflict_detection(mut self) -> Self {
        self.conflict_detection = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn committed(&self) -> bool {
        self.count(|c| matches!(c, Call::CommitAll(_))) > 0
    }

    pub fn pushed(&self) -> bool {
        self.count(|c| *c == Call::Push) > 0
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().1
    }

    async fn enter(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        {
            let mut guard = self.in_flight.lock().unwrap();
            guard.0 += 1;
            guard.1 = guard.1.max(guard.0);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.lock().unwrap().0 -= 1;
    }
}

fn snapshot(changed: &[&str], conflicted: &[&str]) -> RepositoryStatus {
    RepositoryStatus {
        changed: changed.iter().map(|p| VaultPath::new(p)).collect(),
        conflicted: conflicted.iter().map(|p| VaultPath::new(p)).collect(),
    }
}

fn failed(command: &str, message: String) -> Error {
    Error::CommandFailed {
        command: command.to_string(),
        message,
    }
}

#[async_trait]
impl GitBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn supports_conflict_detection(&self) -> bool {
        self.conflict_detection
    }

    async fn check_requirements(&self) -> Readiness {
        self.enter(Call::CheckRequirements).await;
        let mut script = self.script.lock().unwrap();
        script
            .readiness
            .pop_front()
            .unwrap_or(script.default_readiness)
    }

    async fn status(&self) -> Result<RepositoryStatus> {
        self.enter(Call::Status).await;
        let status = {
            let mut script = self.script.lock().unwrap();
            script
                .statuses
                .pop_front()
                .unwrap_or_else(|| script.default_status.clone())
        };
        *self.last_status.lock().unwrap() = status.clone();
        Ok(status)
    }

    async fn pull(&self) -> Result<usize> {
        self.enter(Call::Pull).await;
        let next = self.script.lock().unwrap().pulls.pop_front();
        match next {
            Some(Ok(files)) => Ok(files),
            Some(Err(message)) => Err(failed("git pull", message)),
            None => Ok(0),
        }
    }

    async fn push(&self) -> Result<usize> {
        self.enter(Call::Push).await;
        let push = self.script.lock().unwrap().push.clone();
        push.map_err(|m| failed("git push", m))
    }

    async fn commit_all(&self, message: &str) -> Result<usize> {
        self.enter(Call::CommitAll(message.to_string())).await;
        if let Some(message) = self.script.lock().unwrap().commit_error.clone() {
            return Err(failed("git commit", message));
        }
        Ok(self.last_status.lock().unwrap().changed.len())
    }

    async fn branch_info(&self) -> Result<BranchInfo> {
        self.enter(Call::BranchInfo).await;
        let script = self.script.lock().unwrap();
        match &script.branch_error {
            Some(message) => Err(failed("git rev-parse", message.clone())),
            None => Ok(script.branch.clone()),
        }
    }

    async fn can_push(&self) -> Result<bool> {
        self.enter(Call::CanPush).await;
        Ok(self.script.lock().unwrap().can_push)
    }
}
