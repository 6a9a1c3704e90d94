//! Idle watchdog
//!
//! A single-shot rescheduling timer that converts event silence into a
//! synthetic `user_idle` domain event. Every handled event cancels the
//! pending timer and schedules a new one; at most one timer is pending at
//! any instant. The expiry callback feeds back into `handle_event`, which
//! reschedules again; the loop only stops via `stop()`.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub struct IdleWatchdog {
    pending: Mutex<Option<JoinHandle<()>>>,
    last_activity: Mutex<Instant>,
}

impl IdleWatchdog {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Record activity; idle time is measured from the latest touch.
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn idle_elapsed(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Cancel any pending timer and schedule a new one. The slot is swapped
    /// under the lock, so a cancelled timer can never fire alongside its
    /// replacement.
    pub fn reschedule<F>(&self, delay: Duration, on_expiry: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = self.pending.lock();
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_expiry();
        }));
    }

    /// Cancel the pending timer, if any. The loop stays stopped until the
    /// next `reschedule`.
    pub fn stop(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }
}

impl Default for IdleWatchdog {
    fn default() -> Self {
        Self::new()
    }
}
