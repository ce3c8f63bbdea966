//! Pull workflow behaviour against a scripted backend.

mod common;

use common::{harness, harness_with};
use pretty_assertions::assert_eq;
use rstest::rstest;
use vault_sync::{CONFLICT_REPORT_PATH, CoordinatorState, PullOutcome, SyncSettings};
use vault_test_utils::{Call, FakeBackend, MemoryVault};

#[rstest]
#[case(0, PullOutcome::UpToDate, "Everything is up-to-date")]
#[case(1, PullOutcome::Pulled { files: 1 }, "Pulled 1 files from remote")]
#[case(7, PullOutcome::Pulled { files: 7 }, "Pulled 7 files from remote")]
#[tokio::test]
async fn test_pull_reports_updated_count(
    #[case] files: usize,
    #[case] expected: PullOutcome,
    #[case] message: &str,
) {
    let h = harness(FakeBackend::new().with_pull(files));

    let outcome = h.coordinator.pull().await.unwrap();

    assert_eq!(outcome, expected);
    assert_eq!(h.log.texts(), vec![message]);
    assert_eq!(h.coordinator.state(), CoordinatorState::Idle);
}

#[tokio::test]
async fn test_pull_checks_status_after_pulling() {
    let h = harness(FakeBackend::new());

    h.coordinator.pull().await.unwrap();

    assert_eq!(
        h.backend.calls(),
        vec![Call::CheckRequirements, Call::Pull, Call::Status]
    );
}

#[tokio::test]
async fn test_pull_with_conflicts_reports_without_writing_report() {
    let h = harness(FakeBackend::new().with_pull(2).with_status(&[], &["x.md"]));

    let outcome = h.coordinator.pull().await.unwrap();

    assert_eq!(outcome, PullOutcome::Conflicted { files: 2, conflicts: 1 });
    assert_eq!(
        h.log.texts(),
        vec!["Pulled 2 files from remote", "You have 1 conflict files"]
    );
    assert_eq!(h.log.errors(), vec!["You have 1 conflict files"]);
    assert_eq!(h.coordinator.state(), CoordinatorState::Conflicted);
    assert!(h.vault.file(CONFLICT_REPORT_PATH).is_none());
    assert!(h.vault.opened().is_empty());
}

#[tokio::test]
async fn test_pull_without_conflict_detection_skips_status() {
    let h = harness(
        FakeBackend::new()
            .without_conflict_detection()
            .with_status(&[], &["ignored.md"]),
    );

    let outcome = h.coordinator.pull().await.unwrap();

    assert_eq!(outcome, PullOutcome::UpToDate);
    assert_eq!(h.backend.count(|c| *c == Call::Status), 0);
    assert_eq!(h.coordinator.state(), CoordinatorState::Idle);
}

#[tokio::test]
async fn test_pull_error_is_reported_and_state_returns_to_idle() {
    let h = harness(FakeBackend::new().with_pull_error("network unreachable"));

    let err = h.coordinator.pull().await.unwrap_err();

    assert_eq!(err.to_string(), "`git pull` failed: network unreachable");
    assert_eq!(h.log.errors(), vec!["`git pull` failed: network unreachable"]);
    assert_eq!(h.coordinator.state(), CoordinatorState::Idle);
    assert_eq!(h.backend.count(|c| *c == Call::Status), 0);
}

#[tokio::test]
async fn test_pull_clears_conflicted_state_once_resolved() {
    let backend = FakeBackend::new().then_status(&[], &["x.md"]);
    let h = harness(backend);

    h.coordinator.pull().await.unwrap();
    assert_eq!(h.coordinator.state(), CoordinatorState::Conflicted);

    let outcome = h.coordinator.pull().await.unwrap();

    assert_eq!(outcome, PullOutcome::UpToDate);
    assert_eq!(h.coordinator.state(), CoordinatorState::Idle);
}

#[tokio::test]
async fn test_pull_messages_hidden_when_popups_disabled() {
    let settings = SyncSettings {
        disable_popups: true,
        ..Default::default()
    };
    let h = harness_with(
        FakeBackend::new().with_pull(3).with_status(&[], &["x.md"]),
        settings,
        MemoryVault::new(),
    );

    h.coordinator.pull().await.unwrap();

    assert_eq!(h.log.texts(), vec!["You have 1 conflict files"]);
}
