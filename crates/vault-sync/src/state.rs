//! Coordinator status as seen by observers.

use std::fmt;

use tokio::sync::watch;

/// What the coordinator is currently doing.
///
/// `Idle` and `Conflicted` are rest states. The others are held only for
/// the duration of a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinatorState {
    /// Backend requirements have not been satisfied yet
    #[default]
    NotReady,
    Idle,
    CheckingStatus,
    Pulling,
    Committing,
    Pushing,
    /// Unresolved conflicts are waiting for the user
    Conflicted,
}

impl CoordinatorState {
    /// Whether a backend call is in progress.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::CheckingStatus | Self::Pulling | Self::Committing | Self::Pushing
        )
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotReady => "not ready",
            Self::Idle => "idle",
            Self::CheckingStatus => "checking status",
            Self::Pulling => "pulling",
            Self::Committing => "committing",
            Self::Pushing => "pushing",
            Self::Conflicted => "conflicted",
        };
        f.write_str(label)
    }
}

/// Single owner of the live [`CoordinatorState`].
///
/// Only the coordinator writes; observers read a snapshot or subscribe.
#[derive(Debug)]
pub(crate) struct StateCell {
    tx: watch::Sender<CoordinatorState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self {
            tx: watch::Sender::new(CoordinatorState::NotReady),
        }
    }

    pub(crate) fn get(&self) -> CoordinatorState {
        *self.tx.borrow()
    }

    pub(crate) fn set(&self, next: CoordinatorState) {
        let previous = self.tx.send_replace(next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "State changed");
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_not_ready() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), CoordinatorState::NotReady);
    }

    #[test]
    fn test_subscribers_see_latest_value() {
        let cell = StateCell::new();
        let mut rx = cell.subscribe();

        cell.set(CoordinatorState::Pulling);
        cell.set(CoordinatorState::Idle);

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CoordinatorState::Idle);
    }

    #[test]
    fn test_busy_states() {
        assert!(CoordinatorState::Pushing.is_busy());
        assert!(!CoordinatorState::Idle.is_busy());
        assert!(!CoordinatorState::Conflicted.is_busy());
        assert_eq!(CoordinatorState::CheckingStatus.to_string(), "checking status");
    }
}
