//! Delayed task execution tied to engine shutdown.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Spawns delayed actions that all die with the engine.
///
/// Every task observes a child of the root token. Cancelling the root
/// abandons any task still waiting on its delay; a task whose delay has
/// already elapsed runs to completion.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    root: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler with a fresh root token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless the scheduler shuts down first.
    pub fn schedule<F>(&self, label: &'static str, delay: Duration, task: F) -> ScheduledTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.root.child_token();
        let waiter = token.clone();
        trace!(label, ?delay, "Scheduling task");

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = waiter.cancelled() => {
                    debug!(label, "Scheduled task cancelled before firing");
                }
                _ = tokio::time::sleep(delay) => {
                    trace!(label, "Scheduled task firing");
                    task.await;
                }
            }
        });

        ScheduledTask { token, handle }
    }

    /// Token observed by long-lived workers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Whether [`Scheduler::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancel every pending task and signal workers to stop.
    pub fn shutdown(&self) {
        debug!("Scheduler shutting down");
        self.root.cancel();
    }
}

/// Handle to one scheduled action.
#[derive(Debug)]
pub struct ScheduledTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Abandon the task if it has not fired yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task has fired or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to fire or be cancelled.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            debug!(error = %e, "Scheduled task did not complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_after_delay() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        let task = scheduler.schedule("test", Duration::from_secs(5), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        task.wait().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_pending_tasks() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        let task = scheduler.schedule("test", Duration::from_secs(5), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.shutdown();
        task.wait().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(scheduler.is_shut_down());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_one_task_leaves_others() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let first = fired.clone();
        let cancelled = scheduler.schedule("first", Duration::from_secs(1), async move {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let second = fired.clone();
        let kept = scheduler.schedule("second", Duration::from_secs(1), async move {
            second.fetch_add(10, Ordering::SeqCst);
        });

        cancelled.cancel();
        cancelled.wait().await;
        kept.wait().await;

        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }
}
