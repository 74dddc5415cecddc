//! Debounced trigger timers.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default debounce window for on-demand sync triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(25);

/// A cancellable pending-task slot with a fixed delay.
///
/// Arming replaces any pending task, so repeated triggers within the
/// window collapse into one eventual execution carrying whatever the
/// latest caller put into its future.
pub struct DebouncedTrigger {
    delay: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedTrigger {
    /// Creates a trigger with the given delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: Mutex::new(None),
        }
    }

    /// Arms (or re-arms) the trigger: after the delay, `task` runs.
    ///
    /// Any previously armed task is aborted first.
    pub fn arm<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let mut slot = self.handle.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancels the pending task, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    /// Returns true while a task is pending or still running.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DebouncedTrigger {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let trigger = DebouncedTrigger::new(Duration::from_secs(25));
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        trigger.arm(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(trigger.is_armed());

        tokio::time::advance(Duration::from_secs(24)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_triggers_coalesce_into_one_run() {
        let trigger = DebouncedTrigger::new(Duration::from_secs(25));
        let count = Arc::new(AtomicUsize::new(0));
        let last_reason = Arc::new(Mutex::new(""));

        let c = count.clone();
        let r = last_reason.clone();
        trigger.arm(async move {
            c.fetch_add(1, Ordering::SeqCst);
            *r.lock() = "first";
        });

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        let c = count.clone();
        let r = last_reason.clone();
        trigger.arm(async move {
            c.fetch_add(1, Ordering::SeqCst);
            *r.lock() = "second";
        });

        // 24 s after the second trigger: still pending (the first trigger's
        // 25 s mark has long passed but that task was aborted).
        tokio::time::advance(Duration::from_secs(24)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*last_reason.lock(), "second");

        // And nothing else fires later.
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_execution() {
        let trigger = DebouncedTrigger::new(Duration::from_secs(25));
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        trigger.arm(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        trigger.cancel();
        assert!(!trigger.is_armed());

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
