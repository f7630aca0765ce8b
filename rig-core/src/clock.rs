//! Monotonic time abstractions shared by the motion and telemetry contexts.
//!
//! Firmware binds these to `embassy-time`, the emulator to the host clock,
//! and tests to hand-advanced counters, so the same window and pause logic
//! runs unchanged on every target.

use core::time::Duration;

/// Trait implemented by monotonic instant wrappers used for window tracking.
pub trait MonotonicInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Hardware timing primitive owned by one execution context: a monotonic
/// clock plus a blocking pause.
///
/// The pause is deliberately blocking. The motion context owns its core for
/// the whole of a phase pair; converting this to a yield would shift when
/// the wait returns and with it the run-time window downstream accounting
/// depends on.
pub trait Timebase {
    /// Monotonic timestamp type produced by this timebase.
    type Instant: MonotonicInstant;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Blocks the calling context for `duration`.
    fn pause(&mut self, duration: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    struct MillisInstant(u64);

    impl MonotonicInstant for MillisInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }
    }

    #[test]
    fn duration_since_saturates_backwards() {
        let earlier = MillisInstant(500);
        let later = MillisInstant(1_700);

        assert_eq!(
            later.saturating_duration_since(earlier),
            Duration::from_millis(1_200)
        );
        assert_eq!(earlier.saturating_duration_since(later), Duration::ZERO);
    }
}
