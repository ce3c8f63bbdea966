//! The sync coordinator.
//!
//! Every operation that touches the backend goes through one
//! [`TaskQueue`], whether it comes from a timer or from the user. The
//! `request_*` methods are fire-and-forget; the async methods of the same
//! name enqueue the same work and wait for its outcome.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, watch};
use vault_fs::Vault;
use vault_git::{GitBackend, Readiness};

use crate::backends::BackendProvider;
use crate::config::SyncSettings;
use crate::display::{Notifier, StatusSink};
use crate::error::{Error, Result};
use crate::queue::TaskQueue;
use crate::reporter::ConflictReporter;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::state::{CoordinatorState, StateCell};
use crate::workflow::{BackupOutcome, BackupRequest, Inspection, PullOutcome, PushOutcome};

/// External services the coordinator depends on.
pub struct Collaborators {
    pub backends: Arc<dyn BackendProvider>,
    pub vault: Arc<dyn Vault>,
    pub sink: Arc<dyn StatusSink>,
    pub scheduler: Arc<dyn Scheduler>,
}

enum Timers {
    Unarmed,
    Armed(Vec<TimerHandle>),
    Disarmed,
}

/// Serializes pull, backup and push workflows against one backend.
pub struct Coordinator {
    pub(crate) settings: SyncSettings,
    backends: Arc<dyn BackendProvider>,
    backend: Mutex<Option<Arc<dyn GitBackend>>>,
    pub(crate) notifier: Notifier,
    pub(crate) reporter: ConflictReporter,
    scheduler: Arc<dyn Scheduler>,
    timers: Mutex<Timers>,
    pub(crate) state: StateCell,
    queue: TaskQueue,
}

impl Coordinator {
    pub fn new(settings: SyncSettings, collaborators: Collaborators) -> Arc<Self> {
        let Collaborators {
            backends,
            vault,
            sink,
            scheduler,
        } = collaborators;
        Arc::new(Self {
            notifier: Notifier::new(sink, settings.disable_popups),
            reporter: ConflictReporter::new(vault),
            settings,
            backends,
            backend: Mutex::new(None),
            scheduler,
            timers: Mutex::new(Timers::Unarmed),
            state: StateCell::new(),
            queue: TaskQueue::new(),
        })
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn state(&self) -> CoordinatorState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    /// Whether a backend passed its requirement check.
    pub fn is_ready(&self) -> bool {
        self.lock_backend().is_some()
    }

    /// Select a backend and check its requirements.
    ///
    /// On success the coordinator becomes idle and arms its periodic
    /// triggers. Runs on the queue like every other backend access.
    pub async fn initialize(self: &Arc<Self>) -> Result<Readiness> {
        self.run("initialize", |this| async move {
            Ok(this.initialize_now().await)
        })
        .await
    }

    pub fn request_pull(self: &Arc<Self>) {
        self.submit("pull", None, |this| async move { this.pull_workflow().await });
    }

    pub fn request_backup(self: &Arc<Self>, request: BackupRequest) {
        self.submit("backup", None, move |this| async move {
            this.backup_workflow(request).await
        });
    }

    /// Commit everything without pushing.
    pub fn request_commit(self: &Arc<Self>, message: Option<String>) {
        self.request_backup(BackupRequest::commit(message));
    }

    pub fn request_push(self: &Arc<Self>) {
        self.submit("push", None, |this| async move { this.push_workflow().await });
    }

    pub async fn pull(self: &Arc<Self>) -> Result<PullOutcome> {
        self.run("pull", |this| async move { this.pull_workflow().await })
            .await
    }

    pub async fn backup(self: &Arc<Self>, request: BackupRequest) -> Result<BackupOutcome> {
        self.run("backup", move |this| async move {
            this.backup_workflow(request).await
        })
        .await
    }

    pub async fn commit(self: &Arc<Self>, message: Option<String>) -> Result<BackupOutcome> {
        self.backup(BackupRequest::commit(message)).await
    }

    pub async fn push(self: &Arc<Self>) -> Result<PushOutcome> {
        self.run("push", |this| async move { this.push_workflow().await })
            .await
    }

    /// Branch and working-tree status, `None` when the backend is not ready.
    pub async fn inspect(self: &Arc<Self>) -> Result<Option<Inspection>> {
        self.run("inspect", |this| async move { this.inspect_workflow().await })
            .await
    }

    /// Stop the periodic triggers. Queued and running work is unaffected.
    pub fn disarm(&self) {
        let previous = std::mem::replace(&mut *self.lock_timers(), Timers::Disarmed);
        if let Timers::Armed(handles) = previous {
            tracing::debug!(timers = handles.len(), "Disarming periodic triggers");
            drop(handles);
        }
    }

    /// Wait for everything enqueued so far.
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    pub(crate) fn active_backend(&self) -> Option<Arc<dyn GitBackend>> {
        self.lock_backend().clone()
    }

    /// The ready backend, initializing first if needed. `None` when the
    /// backend still is not usable; the caller then does nothing.
    pub(crate) async fn ensure_ready(self: &Arc<Self>) -> Option<Arc<dyn GitBackend>> {
        if let Some(backend) = self.active_backend() {
            return Some(backend);
        }
        if self.initialize_now().await.is_valid() {
            self.active_backend()
        } else {
            tracing::debug!("Backend not ready, skipping workflow");
            None
        }
    }

    async fn initialize_now(self: &Arc<Self>) -> Readiness {
        let backend = self.backends.select(&self.settings);
        tracing::debug!(backend = backend.name(), "Checking backend requirements");
        let readiness = backend.check_requirements().await;

        match readiness {
            Readiness::Valid => {
                *self.lock_backend() = Some(backend);
                if self.state() == CoordinatorState::NotReady {
                    self.state.set(CoordinatorState::Idle);
                }
                tracing::info!("Sync coordinator ready");
                if self.arm() && self.settings.pull_on_start {
                    self.request_pull();
                }
            }
            Readiness::MissingGit => self.not_ready("Cannot run git command"),
            Readiness::MissingRepo => self.not_ready(
                "Can't find a valid git repository. Please create one or clone an existing repo.",
            ),
            Readiness::WrongSettings => {
                self.not_ready("Are your remote and author settings set?")
            }
        }
        readiness
    }

    fn not_ready(&self, message: &str) {
        *self.lock_backend() = None;
        self.state.set(CoordinatorState::NotReady);
        self.notifier.error(message);
    }

    /// Arm the periodic triggers the first time the coordinator becomes
    /// ready. Returns whether this call armed them.
    fn arm(self: &Arc<Self>) -> bool {
        let mut timers = self.lock_timers();
        if !matches!(*timers, Timers::Unarmed) {
            return false;
        }

        let mut handles = Vec::new();
        if let Some(period) = self.settings.auto_backup_period() {
            let weak = Arc::downgrade(self);
            tracing::debug!(?period, "Arming automatic backup");
            handles.push(self.scheduler.every(
                period,
                Arc::new(move || {
                    if let Some(this) = weak.upgrade() {
                        this.request_backup(BackupRequest::automatic());
                    }
                }),
            ));
        }
        if let Some(period) = self.settings.auto_pull_period() {
            let weak = Arc::downgrade(self);
            tracing::debug!(?period, "Arming automatic pull");
            handles.push(self.scheduler.every(
                period,
                Arc::new(move || {
                    if let Some(this) = weak.upgrade() {
                        this.request_pull();
                    }
                }),
            ));
        }
        *timers = Timers::Armed(handles);
        true
    }

    /// Enqueue a workflow. With `reply`, its result is handed back instead
    /// of being logged by the queue.
    fn submit<T, F, Fut>(
        self: &Arc<Self>,
        name: &'static str,
        reply: Option<oneshot::Sender<Result<T>>>,
        workflow: F,
    ) where
        T: fmt::Debug + Send + 'static,
        F: FnOnce(Arc<Self>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let this = Arc::clone(self);
        self.queue.enqueue(move || {
            Box::pin(async move {
                let result = workflow(Arc::clone(&this)).await;
                let result = this.settle(name, result);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                        Ok(())
                    }
                    None => result.map(|_| ()),
                }
            })
        });
    }

    async fn run<T, F, Fut>(self: &Arc<Self>, name: &'static str, workflow: F) -> Result<T>
    where
        T: fmt::Debug + Send + 'static,
        F: FnOnce(Arc<Self>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(name, Some(tx), workflow);
        rx.await.map_err(|_| Error::TaskAborted)?
    }

    /// Report a failed workflow. A workflow that failed mid-call returns
    /// to idle; one that already restored its resting state keeps it.
    fn settle<T: fmt::Debug>(&self, name: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(outcome) => tracing::debug!(workflow = name, ?outcome, "Workflow finished"),
            Err(e) => {
                self.notifier.error(e.to_string());
                if self.state().is_busy() {
                    self.state.set(CoordinatorState::Idle);
                }
            }
        }
        result
    }

    fn lock_backend(&self) -> MutexGuard<'_, Option<Arc<dyn GitBackend>>> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state())
            .field("ready", &self.is_ready())
            .field("queue", &self.queue)
            .finish()
    }
}
