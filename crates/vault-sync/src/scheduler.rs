//! Periodic triggers.
//!
//! The coordinator never owns a timer directly. It asks a [`Scheduler`]
//! for a repeating tick and keeps the returned [`TimerHandle`]; dropping
//! the handle stops the ticks.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

/// Callback invoked on every tick.
pub type Tick = Arc<dyn Fn() + Send + Sync>;

/// Source of repeating ticks.
pub trait Scheduler: Send + Sync {
    /// Call `tick` every `period`, first after one full period.
    fn every(&self, period: Duration, tick: Tick) -> TimerHandle;
}

/// Keeps a repeating timer alive. Dropping it cancels the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Ticks driven by the Tokio timer. Must be used inside a runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, tick: Tick) -> TimerHandle {
        let Some(start) = Instant::now().checked_add(period) else {
            tracing::warn!(?period, "Period out of range, timer not started");
            return TimerHandle::new(|| {});
        };
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        TimerHandle::new(move || task.abort())
    }
}

struct ManualTimer {
    period: Duration,
    next_due: Duration,
    tick: Tick,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    timers: Vec<ManualTimer>,
}

/// A scheduler whose clock only moves when told to.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<ManualClock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers that have not been cancelled.
    pub fn active_timers(&self) -> usize {
        self.lock()
            .timers
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Move the clock forward, firing every tick that falls due in order.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now.saturating_add(by);
        loop {
            let due = {
                let mut clock = self.lock();
                clock.timers.retain(|t| !t.cancelled.load(Ordering::SeqCst));
                let next = clock
                    .timers
                    .iter_mut()
                    .filter(|t| t.next_due <= target)
                    .min_by_key(|t| t.next_due);
                match next {
                    Some(timer) => {
                        let fired_at = timer.next_due;
                        timer.next_due = fired_at.saturating_add(timer.period);
                        let tick = Arc::clone(&timer.tick);
                        clock.now = fired_at;
                        Some(tick)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };
            match due {
                Some(tick) => tick(),
                None => break,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, tick: Tick) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        {
            let mut clock = self.lock();
            let next_due = clock.now.saturating_add(period);
            clock.timers.push(ManualTimer {
                period,
                next_due,
                tick,
                cancelled: Arc::clone(&cancelled),
            });
        }
        TimerHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("timers", &clock.timers.len())
            .finish()
    }
}
