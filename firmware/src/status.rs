#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared motion status slots.
//!
//! Two single-writer values cross from the motion core to the telemetry
//! core outside the mailbox: the finished flag driving the energy window
//! and the run time of the last closed window. The motion core is the only
//! writer of both; the telemetry core only reads. Relaxed ordering is
//! sufficient under that discipline; the mailbox carries the actual
//! completion events.

use core::time::Duration;

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use rig_core::motion::StatusPublisher;

/// Set while the most recent leg has settled and the next has not begun.
static MOTOR_FINISHED: AtomicBool = AtomicBool::new(false);
/// Run time of the last closed window, in milliseconds.
static MOTOR_RUN_TIME_MS: AtomicU32 = AtomicU32::new(0);

/// Reads the finished flag published by the motion core.
pub fn motor_finished() -> bool {
    MOTOR_FINISHED.load(Ordering::Relaxed)
}

/// Reads the last published run time.
pub fn motor_run_time() -> Duration {
    Duration::from_millis(u64::from(MOTOR_RUN_TIME_MS.load(Ordering::Relaxed)))
}

fn truncate_millis(run_time: Duration) -> u32 {
    u32::try_from(run_time.as_millis()).unwrap_or(u32::MAX)
}

/// Publisher handle held by the motion core, the sole writer of both
/// slots.
#[derive(Copy, Clone, Debug, Default)]
pub struct SharedMotionStatus;

impl SharedMotionStatus {
    /// Creates the publisher handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatusPublisher for SharedMotionStatus {
    fn publish_finished(&mut self, finished: bool) {
        MOTOR_FINISHED.store(finished, Ordering::Relaxed);
    }

    fn publish_run_time(&mut self, run_time: Duration) {
        MOTOR_RUN_TIME_MS.store(truncate_millis(run_time), Ordering::Relaxed);
    }
}
