//! Shared setup for coordinator tests.

#![allow(dead_code)]

use std::sync::Arc;

use vault_sync::{
    Collaborators, Coordinator, FixedBackend, ManualScheduler, MessageLog, SyncSettings,
};
use vault_test_utils::{FakeBackend, MemoryVault};

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub vault: Arc<MemoryVault>,
    pub log: Arc<MessageLog>,
    pub scheduler: Arc<ManualScheduler>,
    pub coordinator: Arc<Coordinator>,
}

pub fn harness(backend: FakeBackend) -> Harness {
    harness_with(backend, SyncSettings::default(), MemoryVault::new())
}

pub fn harness_with(backend: FakeBackend, settings: SyncSettings, vault: MemoryVault) -> Harness {
    let backend = Arc::new(backend);
    let vault = Arc::new(vault);
    let log = Arc::new(MessageLog::new());
    let scheduler = Arc::new(ManualScheduler::new());
    let coordinator = Coordinator::new(
        settings,
        Collaborators {
            backends: Arc::new(FixedBackend(backend.clone())),
            vault: vault.clone(),
            sink: log.clone(),
            scheduler: scheduler.clone(),
        },
    );
    Harness {
        backend,
        vault,
        log,
        scheduler,
        coordinator,
    }
}
