#![cfg(target_os = "none")]

//! Embassy-backed timing primitives.

use core::time::Duration;

use embassy_time::{Instant, block_for};

use rig_core::clock::{MonotonicInstant, Timebase};

/// Monotonic instant backed by the shared hardware timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RigInstant(Instant);

impl RigInstant {
    /// Captures the current instant.
    pub fn now() -> Self {
        Self(Instant::now())
    }
}

impl From<Instant> for RigInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl MonotonicInstant for RigInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_duration_since(earlier.0).as_micros())
    }
}

/// Blocking timebase for the motion context, which owns core 1 outright.
#[derive(Copy, Clone, Debug, Default)]
pub struct MotionTimebase;

impl MotionTimebase {
    /// Creates the timebase handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Timebase for MotionTimebase {
    type Instant = RigInstant;

    fn now(&self) -> RigInstant {
        RigInstant::now()
    }

    fn pause(&mut self, duration: Duration) {
        block_for(embassy_duration(duration));
    }
}

/// Converts a core duration to the Embassy tick domain, saturating.
pub fn embassy_duration(duration: Duration) -> embassy_time::Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    embassy_time::Duration::from_micros(micros)
}
