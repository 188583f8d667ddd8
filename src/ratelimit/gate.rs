//! The admission gate: a blocking fixed-window rate limit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use super::window::TimeWindow;

/// Error returned to a caller whose admission wait was abandoned because
/// the gate was closed.
#[derive(Debug, Error)]
#[error("admission gate closed")]
pub struct GateClosed;

/// Window accounting, guarded by the gate's mutex.
struct GateState {
    /// When the current accounting window started
    window_start: Instant,
    /// Admissions left in the current window
    remaining: u32,
}

/// A shared admission gate that grants at most `limit` admissions per
/// accounting window.
///
/// [`acquire`](Self::acquire) suspends the calling task while the window is
/// exhausted and wakes it at the next window boundary; waiters race for the
/// refilled capacity, so exactly `limit` callers proceed per window no
/// matter how many are queued. The gate starts full: a cold-start burst of
/// up to `limit` callers is admitted without waiting.
///
/// The gate is safe to share across any number of tasks via `Arc`. Its
/// mutex is only ever held for the admission arithmetic, never across an
/// await point.
pub struct RateGate {
    /// Maximum admissions per window
    limit: u32,
    /// Window length
    window: Duration,
    /// Window accounting
    state: Mutex<GateState>,
    /// Set once by `close`, checked on every admission attempt
    closed: AtomicBool,
    /// Wakes waiters when the gate closes
    shutdown: Notify,
}

impl RateGate {
    /// Create a gate admitting `limit` calls per window unit.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero. Configuration loading rejects a zero
    /// limit before it can reach this constructor.
    pub fn new(limit: u32, window: TimeWindow) -> Self {
        Self::with_duration(limit, window.duration())
    }

    /// Create a gate with an arbitrary window duration.
    pub fn with_duration(limit: u32, window: Duration) -> Self {
        assert!(limit > 0, "request limit must be positive");
        Self {
            limit,
            window,
            state: Mutex::new(GateState {
                window_start: Instant::now(),
                remaining: limit,
            }),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    /// Wait until a slot is available in the current window and consume it.
    ///
    /// Returns `Ok(())` once one unit of capacity has been consumed. When
    /// the window is exhausted the task suspends until the window boundary
    /// and re-checks in a loop: several waiters may race for the same
    /// refill, and the losers wait for the boundary after that.
    ///
    /// Returns `Err(GateClosed)` without consuming a slot if
    /// [`close`](Self::close) was called, whether before or during the
    /// wait. Dropping the returned future likewise abandons the wait with
    /// nothing consumed.
    pub async fn acquire(&self) -> Result<(), GateClosed> {
        loop {
            // Register for the shutdown wakeup before reading the flag so
            // a close between the read and the sleep cannot be missed.
            let shutdown = self.shutdown.notified();
            tokio::pin!(shutdown);
            shutdown.as_mut().enable();

            let deadline = {
                let mut state = self.state.lock();
                if self.closed.load(Ordering::Acquire) {
                    return Err(GateClosed);
                }
                self.refill(&mut state);
                if state.remaining > 0 {
                    state.remaining -= 1;
                    trace!(remaining = state.remaining, "admission granted");
                    return Ok(());
                }
                state.window_start + self.window
            };

            debug!(
                wait = ?deadline.duration_since(Instant::now()),
                "window exhausted, waiting for refill"
            );

            tokio::select! {
                _ = time::sleep_until(deadline) => {}
                _ = &mut shutdown => return Err(GateClosed),
            }
        }
    }

    /// Close the gate, waking every waiter with [`GateClosed`].
    ///
    /// Subsequent `acquire` calls fail immediately even if capacity is
    /// left. Closing is idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.shutdown.notify_waiters();
    }

    /// Admissions left in the current window.
    ///
    /// Applies the refill check first, so an idle gate whose window has
    /// lapsed reports a full window.
    pub fn remaining(&self) -> u32 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.remaining
    }

    /// Maximum admissions per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Time until the current window refills, zero if a refill is due.
    pub fn time_until_refill(&self) -> Duration {
        let state = self.state.lock();
        let elapsed = state.window_start.elapsed();
        if elapsed >= self.window {
            Duration::ZERO
        } else {
            self.window - elapsed
        }
    }

    /// Reset the window if it has expired.
    ///
    /// A single flat reset: several idle windows still refill to `limit`,
    /// never to a multiple of it. `window_start` only ever moves forward.
    fn refill(&self, state: &mut GateState) {
        let now = Instant::now();
        if now.duration_since(state.window_start) >= self.window {
            state.remaining = self.limit;
            state.window_start = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::Arc;
    use tokio_test::assert_ok;

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_admits_up_to_limit_immediately() {
        let gate = RateGate::with_duration(3, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..3 {
            assert_ok!(gate.acquire().await);
        }

        // The gate starts with a full window: no waiting happened.
        assert_eq!(Instant::now(), start);
        assert_eq!(gate.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_excess_caller_waits_for_next_window() {
        let gate = RateGate::with_duration(2, Duration::from_secs(1));
        let start = Instant::now();

        assert_ok!(gate.acquire().await);
        assert_ok!(gate.acquire().await);
        assert_ok!(gate.acquire().await);

        // The third call only completed once the window turned over.
        assert_eq!(Instant::now() - start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_minute_window_defers_sixth_call() {
        let gate = RateGate::with_duration(5, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..5 {
            assert_ok!(gate.acquire().await);
        }
        assert_eq!(Instant::now(), start);

        assert_ok!(gate.acquire().await);
        assert_eq!(Instant::now() - start, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_contention_admits_limit_per_window() {
        let gate = Arc::new(RateGate::with_duration(3, Duration::from_secs(1)));
        let start = Instant::now();

        let waiters = (0..7).map(|_| {
            let gate = gate.clone();
            async move {
                gate.acquire().await.unwrap();
                (Instant::now() - start).as_secs()
            }
        });
        let completed_at = join_all(waiters).await;

        let admitted_in = |window: u64| completed_at.iter().filter(|&&s| s == window).count();
        assert_eq!(admitted_in(0), 3);
        assert_eq!(admitted_in(1), 3);
        assert_eq!(admitted_in(2), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_windows_refill_flat() {
        let gate = RateGate::with_duration(3, Duration::from_secs(1));
        for _ in 0..3 {
            assert_ok!(gate.acquire().await);
        }

        // Three full windows pass with no traffic.
        time::sleep(Duration::from_millis(3_500)).await;

        assert_ok!(gate.acquire().await);
        // A single flat reset: limit - 1 left, not limit * 3 - 1.
        assert_eq!(gate.remaining(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_reports_refilled_window() {
        let gate = RateGate::with_duration(2, Duration::from_secs(1));
        assert_eq!(gate.remaining(), 2);

        assert_ok!(gate.acquire().await);
        assert_eq!(gate.remaining(), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(gate.remaining(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_until_refill_counts_down() {
        let gate = RateGate::with_duration(1, Duration::from_secs(10));
        assert_eq!(gate.time_until_refill(), Duration::from_secs(10));

        time::sleep(Duration::from_secs(4)).await;
        assert_eq!(gate.time_until_refill(), Duration::from_secs(6));

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(gate.time_until_refill(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_waiter_consumes_no_slot() {
        let gate = Arc::new(RateGate::with_duration(2, Duration::from_secs(1)));
        assert_ok!(gate.acquire().await);
        assert_ok!(gate.acquire().await);

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.acquire().await }
        });
        // Let the waiter reach its sleep, then cancel it mid-wait.
        tokio::task::yield_now().await;
        waiter.abort();

        time::sleep(Duration::from_millis(1_100)).await;

        // The refilled window is untouched by the aborted waiter.
        assert_ok!(gate.acquire().await);
        assert_eq!(gate.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_wakes_waiters_without_consuming() {
        let gate = Arc::new(RateGate::with_duration(1, Duration::from_secs(60)));
        let start = Instant::now();
        assert_ok!(gate.acquire().await);

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.acquire().await }
        });
        tokio::task::yield_now().await;

        gate.close();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(GateClosed)));

        // The wake came from close, not from a window boundary.
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_after_close_fails_fast() {
        let gate = RateGate::with_duration(1, Duration::from_secs(1));
        gate.close();

        // Capacity is available, but the gate is closed for good.
        assert!(matches!(gate.acquire().await, Err(GateClosed)));
        assert_eq!(gate.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accessors_expose_construction_parameters() {
        let gate = RateGate::new(5, TimeWindow::Minute);
        assert_eq!(gate.limit(), 5);
        assert_eq!(gate.window(), Duration::from_secs(60));
    }
}
