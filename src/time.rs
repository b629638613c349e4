//! Monotonic millisecond time primitives.
//!
//! The host platform supplies a monotonic millisecond counter (see
//! [`Clock`](crate::ports::Clock)). All deadlines are computed as
//! `now + duration` and compared with wrapping arithmetic, so the protocol
//! stays correct even if the counter wraps.

/// Monotonic timestamp in milliseconds since some arbitrary epoch.
pub type Instant = u64;

/// A span of time in milliseconds.
pub type DurationMs = u32;

/// True once `now` has reached or passed `deadline`.
///
/// Uses wrapping subtraction: any forward distance of less than half the
/// counter range reads as "not yet", everything else as "passed". This keeps
/// comparisons valid across counter wraparound.
pub fn deadline_passed(now: Instant, deadline: Instant) -> bool {
    now.wrapping_sub(deadline) < (1 << 63)
}

/// `base + duration`, wrapping at the counter modulus.
pub fn after(base: Instant, duration: DurationMs) -> Instant {
    base.wrapping_add(u64::from(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_reached_exactly() {
        assert!(deadline_passed(1000, 1000));
    }

    #[test]
    fn deadline_in_future() {
        assert!(!deadline_passed(999, 1000));
    }

    #[test]
    fn deadline_in_past() {
        assert!(deadline_passed(5000, 1000));
    }

    #[test]
    fn survives_counter_wraparound() {
        let deadline = after(u64::MAX - 50, 100); // wraps to 49
        assert_eq!(deadline, 49);
        assert!(!deadline_passed(u64::MAX - 10, deadline));
        assert!(deadline_passed(49, deadline));
        assert!(deadline_passed(200, deadline));
    }
}
