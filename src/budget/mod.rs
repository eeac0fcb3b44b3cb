//! Sliding-window request budget
//!
//! Tracks how many requests were issued inside a trailing time window and
//! computes the wait required before the next request is permitted. The
//! budget itself has no side effects beyond recording; blocking is the
//! session's job.
//!
//! Timestamps are `tokio::time::Instant` so timing tests can run under a
//! paused clock.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Request quota over a trailing time window
///
/// Invariant: as long as callers wait out [`time_until_available`] before
/// issuing, at no instant do more than `max_requests` recorded issuances
/// fall strictly inside the trailing `window`.
///
/// A budget belongs to exactly one session. Sharing one budget across
/// concurrently-executing sessions would break the invariant, because
/// correctness depends on requests being recorded in issuance order.
///
/// [`time_until_available`]: RequestBudget::time_until_available
#[derive(Debug)]
pub struct RequestBudget {
    /// Length of the trailing window the quota applies to
    window: Duration,

    /// Maximum number of issuances permitted inside the window
    max_requests: usize,

    /// Issuance timestamps in arrival order; aged-out entries are evicted
    /// lazily on the next record
    issued: VecDeque<Instant>,
}

impl RequestBudget {
    /// Creates a budget of `max_requests` per trailing `window`
    ///
    /// Both values must be positive; the configuration layer enforces this
    /// before a budget is built.
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            issued: VecDeque::with_capacity(max_requests),
        }
    }

    /// Records one issuance at `at`
    pub fn record(&mut self, at: Instant) {
        self.evict(at);
        self.issued.push_back(at);
    }

    /// Returns the wait until one more request would fit in the window
    ///
    /// Zero whenever fewer than `max_requests` issuances are currently
    /// inside the window. Otherwise the n-th-from-last issuance (where
    /// n = `max_requests`) plus the window length gives the next eligible
    /// instant.
    pub fn time_until_available(&self, now: Instant) -> Duration {
        let live = self.issued_in_window(now);
        if live < self.max_requests {
            return Duration::ZERO;
        }

        // Oldest of the last max_requests issuances. Aged-out entries sit
        // at the front of the deque, so indexing from the back skips them.
        let pivot = self.issued[self.issued.len() - self.max_requests];
        (pivot + self.window).duration_since(now)
    }

    /// Counts issuances strictly inside the trailing window
    pub fn issued_in_window(&self, now: Instant) -> usize {
        self.issued
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }

    /// Drops entries that have aged out of the window
    fn evict(&mut self, now: Instant) {
        while let Some(front) = self.issued.front() {
            if now.duration_since(*front) >= self.window {
                self.issued.pop_front();
            } else {
                break;
            }
        }
    }
}
