//! Cooperative background tasks.
//!
//! A scenario's timed operation may run one auxiliary producer loop next to
//! the governing thread. Cancellation is cooperative: the governing thread
//! cancels the token and then joins; a loop body that never checks the token
//! will hang the run. There is no watchdog by design.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::warn;

/// Shared cancellation flag checked by the background loop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Handle to a spawned background loop, joined synchronously on stop.
pub struct BackgroundTask {
    name: String,
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    /// Spawn `body` on a named thread; it receives the cancellation token and
    /// is expected to return promptly once the token is cancelled.
    pub fn spawn<F>(name: &str, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        let token = CancelToken::new();
        let task_token = token.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(task_token))?;
        Ok(Self {
            name: name.to_string(),
            token,
            handle: Some(handle),
        })
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Cancel and wait until the task has observably stopped. Blocks for as
    /// long as the loop takes to notice the token.
    pub fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(task = %self.name, "background task panicked");
            }
        }
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        // stop() consumed the handle in the normal path; this covers early
        // returns so the thread never outlives the scenario.
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    #[test]
    fn stop_joins_after_cancel() {
        let ticks = Arc::new(AtomicU64::new(0));
        let seen = ticks.clone();
        let task = BackgroundTask::spawn("ticker", move |token| {
            while !token.is_cancelled() {
                seen.fetch_add(1, Ordering::Relaxed);
                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();

        thread::sleep(Duration::from_millis(10));
        task.stop();

        let after = ticks.load(Ordering::Relaxed);
        assert!(after > 0);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(ticks.load(Ordering::Relaxed), after);
    }

    #[test]
    fn drop_cancels_and_joins() {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();
        {
            let _task = BackgroundTask::spawn("dropper", move |token| {
                while !token.is_cancelled() {
                    thread::sleep(Duration::from_millis(1));
                }
                flag.store(true, Ordering::Release);
            })
            .unwrap();
        }
        assert!(stopped.load(Ordering::Acquire));
    }
}
