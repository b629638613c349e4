//! Host clock adapter.
//!
//! Wraps `std::time::Instant` as the monotonic millisecond counter the
//! protocol expects. Embedded targets replace this with their own timer
//! peripheral behind the same [`Clock`] trait.

use crate::ports::Clock;
use crate::time::Instant;

/// Monotonic millisecond clock backed by `std::time::Instant`.
pub struct HostClock {
    start: std::time::Instant,
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for HostClock {
    fn now(&self) -> Instant {
        self.start.elapsed().as_millis() as Instant
    }
}
