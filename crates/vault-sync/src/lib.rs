//! Sync coordinator for git-backed vaults
//!
//! Keeps a local file tree in step with a remote repository by running
//! pull, commit and push workflows one at a time, whatever triggered them:
//!
//! - [`TaskQueue`] runs queued work strictly in order, one task at a time.
//! - [`Coordinator`] owns the queue, the selected backend and the
//!   [`CoordinatorState`] observers read.
//! - [`ConflictReporter`] writes the conflict report into the vault.
//!
//! Backends, the file tree, message display and timers are injected, so
//! every workflow can run against fakes.

pub mod backends;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod queue;
pub mod reporter;
pub mod scheduler;
pub mod state;
pub mod workflow;

pub use backends::{BackendProvider, DefaultBackends, FixedBackend};
pub use config::{CONFIG_PATH, CliSettings, MAX_INTERVAL_MINUTES, InProcessSettings, SyncSettings};
pub use coordinator::{Collaborators, Coordinator};
pub use display::{
    Displayed, ERROR_TIMEOUT, Level, MESSAGE_TIMEOUT, MessageLog, StatusSink,
};
pub use error::{Error, Result};
pub use queue::{TaskFuture, TaskQueue};
pub use reporter::{CONFLICT_REPORT_PATH, ConflictReporter};
pub use scheduler::{ManualScheduler, Scheduler, Tick, TimerHandle, TokioScheduler};
pub use state::CoordinatorState;
pub use workflow::{BackupOutcome, BackupRequest, Inspection, PullOutcome, PushOutcome, Trigger};
