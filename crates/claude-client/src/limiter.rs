use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_MAX_CALLS: u32 = 3;
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

/// Fixed-window call throttle.
///
/// At most `max_calls` units of work are dispatched per `window`. A window
/// opens at the first dispatch after the previous one expired. Callers that
/// find the window full wait for it to roll over; waiters are served in
/// submission order because `tokio::sync::Mutex` is a fair FIFO lock and the
/// lock is held across the wait.
///
/// Not a sliding window: up to `2 * max_calls` calls can
/// land within one `window`-long interval that straddles a boundary.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: u32,
    window: Duration,
    state: Mutex<Window>,
}

#[derive(Debug, Default)]
struct Window {
    opened_at: Option<Instant>,
    dispatched: u32,
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(DEFAULT_MAX_CALLS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// `max_calls` is clamped to at least 1.
    pub fn new(max_calls: u32, window: Duration) -> Self {
        RateLimiter {
            max_calls: max_calls.max(1),
            window,
            state: Mutex::new(Window::default()),
        }
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a dispatch slot is available and claim it.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if let Some(opened_at) = state.opened_at {
            let closes_at = opened_at + self.window;
            if now < closes_at {
                if state.dispatched < self.max_calls {
                    state.dispatched += 1;
                    return;
                }
                debug!(
                    wait_ms = (closes_at - now).as_millis() as u64,
                    "rate window full, waiting for rollover"
                );
                tokio::time::sleep_until(closes_at).await;
            }
        }

        state.opened_at = Some(Instant::now());
        state.dispatched = 1;
    }

    /// Dispatch `work` once a slot is free and return its output.
    pub async fn run<F, T>(&self, work: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        work.await
    }
}
