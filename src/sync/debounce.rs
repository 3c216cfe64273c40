//! Trailing-edge debounce for filter input.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delay used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Runs only the last of a burst of calls, `delay` after it was made.
///
/// Each [`call`](Self::call) aborts the pending one. Dropping the debouncer aborts
/// whatever is still pending. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task` after the delay, replacing any call still waiting.
    pub fn call<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        if let Some(previous) = self.slot().replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self.slot().take() {
            pending.abort();
        }
    }

    /// Whether a scheduled call has not finished yet.
    pub fn is_pending(&self) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;

    type Recorded = Arc<Mutex<Vec<String>>>;

    fn recorder() -> (Recorded, impl Fn(&str) -> BoxFuture<'static, ()>) {
        let seen: Recorded = Arc::default();
        let sink = Arc::clone(&seen);
        let make = move |term: &str| {
            let sink = Arc::clone(&sink);
            let term = term.to_string();
            async move { sink.lock().unwrap().push(term) }.boxed()
        };
        (seen, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_call_in_burst_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (seen, make) = recorder();

        for term in ["L", "La", "Lap", "Laptop"] {
            debouncer.call(make(term));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(seen.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["Laptop".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_all_run() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            debouncer.call(async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(60)).await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_discard_pending_call() {
        let (seen, make) = recorder();

        let debouncer = Debouncer::default();
        debouncer.call(make("cancelled"));
        debouncer.cancel();

        let dropped = Debouncer::default();
        dropped.call(make("dropped"));
        drop(dropped);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(seen.lock().unwrap().is_empty());
        assert!(!debouncer.is_pending());
    }
}
