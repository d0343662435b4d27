//! Deadline tracking for deferred work.
//!
//! The engine has no event loop of its own; the host passes the current
//! time in and the editor asks whether a deadline has passed.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Push the deadline out to `now + delay`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire at most once per schedule: returns `true` and clears the
    /// deadline once `now` has reached it.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
