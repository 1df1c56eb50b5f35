//! A resettable single-deadline timer.
//!
//! The timer never fires on its own.  Its owner asks [`InactivityTimer::take_due`]
//! whenever time may have advanced; at most one deadline is outstanding, and
//! arming always replaces the previous one.

use std::time::{Duration, Instant};

/// Resettable timer holding at most one pending deadline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InactivityTimer {
    deadline: Option<Instant>,
}

impl InactivityTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending deadline and arms a new one at `now + duration`.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        self.deadline = Some(now + duration);
    }

    /// Cancels the pending deadline, if any.  Cancelling has no other effect.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// The pending deadline, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` if a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` if the pending deadline has been reached at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Disarms and returns `true` if the deadline has been reached at `now`.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Time left until the deadline, saturating at zero.  `None` when disarmed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}
