//! Scroll event coalescer.
//!
//! Raw signals arrive in bursts. Each signal (re)starts a fixed debounce
//! window; when the window elapses without another signal, exactly one
//! recomputation is due. The coalescer never sleeps or spawns timers: the
//! host's event loop asks for [`ScrollCoalescer::next_deadline`] and calls
//! [`ScrollCoalescer::poll`] when it passes.

use std::time::{Duration, Instant};

/// Trailing-edge debouncer with an enable switch.
#[derive(Debug, Clone)]
pub struct ScrollCoalescer {
    interval: Duration,
    deadline: Option<Instant>,
    enabled: bool,
    burst: usize,
}

impl ScrollCoalescer {
    /// Disabled coalescer with the given debounce window.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            enabled: false,
            burst: 0,
        }
    }

    /// Debounce window.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start accepting signals.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop accepting signals; any in-flight deadline becomes a no-op.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether signals are accepted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a raw signal at `now`, pushing the deadline out.
    ///
    /// Returns `false` if the coalescer is disabled.
    pub fn signal(&mut self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        self.deadline = Some(now + self.interval);
        self.burst += 1;
        true
    }

    /// When the pending burst settles, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of signals folded into the pending burst.
    pub fn pending_signals(&self) -> usize {
        self.burst
    }

    /// Check whether the burst has settled at `now`.
    ///
    /// Returns `true` at most once per burst, and never while disabled.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };

        if !self.enabled {
            self.deadline = None;
            self.burst = 0;
            return false;
        }

        if now < deadline {
            return false;
        }

        self.deadline = None;
        self.burst = 0;
        true
    }
}
