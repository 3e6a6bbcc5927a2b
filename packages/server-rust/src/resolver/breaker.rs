//! Process-wide circuit breaker for the configuration authority.
//!
//! A failure counter shared by every in-flight request, not per-tenant.
//! Each exhausted fetch adds one failure and refreshes the window deadline;
//! any successful fetch clears the counter; the counter also expires on its
//! own when the window passes without a refresh. Two states only -- Closed
//! and Open -- with no half-open probe: recovery happens through window
//! expiry or a success recorded by a fetch that was already in flight when
//! the breaker opened.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Observable breaker state, derived from the counter and window deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Failures below threshold; resolution proceeds normally.
    Closed,
    /// Threshold reached; all resolution short-circuits until the window
    /// expires or a success resets the counter.
    Open,
}

impl BreakerState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
        }
    }
}

/// Shared failure counter with a sliding expiry window.
///
/// All mutation is single-word atomic; there is no lock. A race between an
/// expiry reset and a concurrent increment can order either way, and both
/// orderings are valid failure windows.
#[derive(Debug)]
pub struct FailureBreaker {
    threshold: u32,
    window: Duration,
    failures: AtomicU32,
    /// Millisecond offset from `epoch` after which the counter is stale.
    /// Zero means no window is active.
    window_deadline_ms: AtomicU64,
    epoch: Instant,
}

impl FailureBreaker {
    #[must_use]
    pub fn new(threshold: u32, window: Duration) -> Self {
        Self {
            threshold,
            window,
            failures: AtomicU32::new(0),
            window_deadline_ms: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    // Process uptime in milliseconds; u64 holds ~584 million years.
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    #[allow(clippy::cast_possible_truncation)]
    fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }

    /// Whether resolution must short-circuit right now.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == BreakerState::Open
    }

    /// Current state, accounting for window expiry.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        let deadline = self.window_deadline_ms.load(Ordering::Acquire);
        if deadline == 0 || self.now_ms() >= deadline {
            return BreakerState::Closed;
        }
        if self.failures.load(Ordering::Acquire) >= self.threshold {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }

    /// Failures recorded in the current window. Zero once the window expires.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        let deadline = self.window_deadline_ms.load(Ordering::Acquire);
        if deadline == 0 || self.now_ms() >= deadline {
            0
        } else {
            self.failures.load(Ordering::Acquire)
        }
    }

    /// Records one exhausted fetch and returns the updated count.
    ///
    /// Refreshes the window deadline, matching the reference behavior where
    /// every increment re-arms the counter's expiry.
    pub fn record_failure(&self) -> u32 {
        let now = self.now_ms();
        let deadline = self.window_deadline_ms.load(Ordering::Acquire);
        if deadline != 0 && now >= deadline {
            // Stale window: restart the count rather than resurrect it.
            self.failures.store(0, Ordering::Release);
        }
        let count = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
        self.window_deadline_ms
            .store(now + self.window_ms(), Ordering::Release);

        metrics::gauge!("gatehouse_breaker_failures").set(f64::from(count));
        if count == self.threshold {
            warn!(
                failures = count,
                threshold = self.threshold,
                "circuit breaker opened, shedding tenant resolution"
            );
            metrics::counter!("gatehouse_breaker_opens_total").increment(1);
        }
        count
    }

    /// Clears the counter after a successful fetch, re-closing an open
    /// breaker for the next request.
    pub fn record_success(&self) {
        let was_open = self.is_open();
        self.failures.store(0, Ordering::Release);
        self.window_deadline_ms.store(0, Ordering::Release);
        metrics::gauge!("gatehouse_breaker_failures").set(0.0);
        if was_open {
            info!("circuit breaker closed after successful fetch");
        }
    }
}
