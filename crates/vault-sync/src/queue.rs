//! Single-flight task queue.
//!
//! Producers run one at a time in submission order. A failing or
//! panicking producer is logged and the queue moves on to the next one.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::Result;

/// Future produced by a queued task.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

type Producer = Box<dyn FnOnce() -> TaskFuture + Send + 'static>;

#[derive(Default)]
struct Pending {
    producers: VecDeque<Producer>,
    running: bool,
}

/// Runs queued producers strictly one after another.
///
/// The producer itself is only called when its turn comes, so any work
/// it does (including building its future) is covered by the
/// single-flight guarantee.
#[derive(Clone, Default)]
pub struct TaskQueue {
    pending: Arc<Mutex<Pending>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a producer. Starts draining if the queue was idle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue<F>(&self, producer: F)
    where
        F: FnOnce() -> TaskFuture + Send + 'static,
    {
        let start = {
            let mut pending = self.lock();
            pending.producers.push_back(Box::new(producer));
            !std::mem::replace(&mut pending.running, true)
        };
        if start {
            tokio::spawn(drain(Arc::clone(&self.pending)));
        }
    }

    /// Number of producers waiting to run, excluding the running one.
    pub fn len(&self) -> usize {
        self.lock().producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a producer is currently executing.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Wait until everything enqueued before this call has finished.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.enqueue(move || {
            Box::pin(async move {
                let _ = tx.send(());
                Ok(())
            })
        });
        let _ = rx.await;
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.lock();
        f.debug_struct("TaskQueue")
            .field("pending", &pending.producers.len())
            .field("running", &pending.running)
            .finish()
    }
}

async fn drain(pending: Arc<Mutex<Pending>>) {
    loop {
        let next = {
            let mut guard = pending.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.producers.pop_front() {
                Some(producer) => producer,
                None => {
                    guard.running = false;
                    return;
                }
            }
        };

        // Each task gets its own Tokio task so a panic is contained.
        match tokio::spawn(async move { next().await }).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Queued task failed"),
            Err(e) => tracing::error!(error = %e, "Queued task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn explode() -> Result<()> {
        panic!("boom")
    }

    fn record(log: &Arc<Mutex<Vec<String>>>, entry: String) {
        log.lock().unwrap().push(entry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_in_submission_order_without_overlap() {
        let queue = TaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for (i, delay) in [30u64, 10, 20].into_iter().enumerate() {
            let log = Arc::clone(&log);
            queue.enqueue(move || {
                Box::pin(async move {
                    record(&log, format!("start {i}"));
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    record(&log, format!("end {i}"));
                    Ok(())
                })
            });
        }
        queue.flush().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start 0", "end 0", "start 1", "end 1", "start 2", "end 2"]
        );
        assert!(!queue.is_running());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_queue() {
        let queue = TaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        queue.enqueue(|| Box::pin(async { Err(Error::TaskAborted) }));
        let after = Arc::clone(&log);
        queue.enqueue(move || {
            Box::pin(async move {
                record(&after, "second".to_string());
                Ok(())
            })
        });
        queue.flush().await;

        assert_eq!(*log.lock().unwrap(), vec!["second"]);
    }

    #[tokio::test]
    async fn test_panic_does_not_stop_queue() {
        let queue = TaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        queue.enqueue(|| Box::pin(async { explode() }));
        let after = Arc::clone(&log);
        queue.enqueue(move || {
            Box::pin(async move {
                record(&after, "survived".to_string());
                Ok(())
            })
        });
        queue.flush().await;

        assert_eq!(*log.lock().unwrap(), vec!["survived"]);
    }

    #[tokio::test]
    async fn test_producer_called_only_when_its_turn_comes() {
        let queue = TaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first = Arc::clone(&log);
        queue.enqueue(move || {
            Box::pin(async move {
                let _ = release_rx.await;
                record(&first, "first done".to_string());
                Ok(())
            })
        });
        let second = Arc::clone(&log);
        queue.enqueue(move || {
            record(&second, "second produced".to_string());
            Box::pin(async { Ok(()) })
        });

        tokio::task::yield_now().await;
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(queue.len(), 1);

        release_tx.send(()).unwrap();
        queue.flush().await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first done", "second produced"]
        );
    }
}
