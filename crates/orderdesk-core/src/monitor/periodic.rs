use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

/// A repeating job with an explicit start/stop contract.
pub struct PeriodicTask;

impl PeriodicTask {
    /// Run `job` once right now, then every `period` until the handle is
    /// stopped or dropped. Must be called inside a Tokio runtime.
    pub fn spawn<F>(period: Duration, mut job: F) -> TaskHandle
    where
        F: FnMut() + Send + 'static,
    {
        // interval_at panics on a zero period
        let period = period.max(Duration::from_millis(1));
        run_guarded(&mut job);

        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                run_guarded(&mut job);
            }
        });

        TaskHandle { join: Some(join) }
    }
}

/// A panicking run is logged; the next tick still happens.
fn run_guarded<F: FnMut()>(job: &mut F) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(panic = %message, "Periodic job panicked");
    }
}

/// Cancels the periodic task on `stop` or drop.
pub struct TaskHandle {
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn stop(mut self) {
        self.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().map(|j| !j.is_finished()).unwrap_or(false)
    }

    fn cancel(&mut self) {
        if let Some(join) = self.join.take() {
            debug!("Stopping periodic task");
            join.abort();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_period() {
        let (count, job) = counter();
        let handle = PeriodicTask::spawn(Duration::from_secs(30), job);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_run_does_not_stop_the_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handle = PeriodicTask::spawn(Duration::from_secs(30), move || {
            let run = c.fetch_add(1, Ordering::SeqCst) + 1;
            if run == 2 {
                panic!("navigator unavailable");
            }
        });

        tokio::time::sleep(Duration::from_secs(91)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert!(handle.is_running());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (count, job) = counter();
        drop(PeriodicTask::spawn(Duration::from_secs(30), job));
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
