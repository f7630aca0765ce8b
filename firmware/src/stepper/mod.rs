#![cfg(target_os = "none")]

//! STEP/DIR stepper driver.
//!
//! Single-axis position driver with a linear speed ramp: the permitted rate
//! at any point is the slowest of the configured maximum, the speed
//! reachable from rest over the distance already travelled, and the speed
//! from which the motor can still stop within the distance remaining
//! (`v = sqrt(2·a·d)` both ways). `advance_one_step` is a poll: it emits at
//! most one step pulse, and only once the current interval has elapsed, so
//! the controller's busy-wait loop can call it back to back.

use embassy_rp::gpio::Output;
use embassy_time::Instant;
use micromath::F32Ext as _;

use rig_core::motion::MotionDriver;

/// High width of a step pulse in CPU cycles (about 2 µs at 125 MHz, well
/// above common driver minimums).
const STEP_PULSE_CYCLES: u32 = 250;

/// Floor applied to the ramp so the first step of a leg is not scheduled
/// infinitely far out.
const MIN_SPEED: f32 = 1.0;

/// Driver for a STEP/DIR stepper interface.
pub struct StepDirDriver<'d> {
    step: Output<'d>,
    dir: Output<'d>,
    current_position: i32,
    target_position: i32,
    leg_started_from: i32,
    max_speed: f32,
    acceleration: f32,
    step_interval_us: u64,
    last_step_at: Option<Instant>,
}

impl<'d> StepDirDriver<'d> {
    /// Creates a driver over the step and direction outputs.
    pub fn new(step: Output<'d>, dir: Output<'d>) -> Self {
        Self {
            step,
            dir,
            current_position: 0,
            target_position: 0,
            leg_started_from: 0,
            max_speed: MIN_SPEED,
            acceleration: 1.0,
            step_interval_us: 0,
            last_step_at: None,
        }
    }

    fn pulse(&mut self) {
        self.step.set_high();
        cortex_m::asm::delay(STEP_PULSE_CYCLES);
        self.step.set_low();
    }

    /// Slowest of the acceleration ramp, the deceleration ramp, and the
    /// configured maximum.
    fn permitted_speed(&self) -> f32 {
        let travelled = (self.current_position - self.leg_started_from).unsigned_abs();
        let remaining = self.distance_remaining().unsigned_abs();
        let accel_limit = (2.0 * self.acceleration * travelled.max(1) as f32).sqrt();
        let decel_limit = (2.0 * self.acceleration * remaining as f32).sqrt();

        accel_limit.min(decel_limit).min(self.max_speed).max(MIN_SPEED)
    }

    fn reschedule(&mut self, now: Instant) {
        self.step_interval_us = (1_000_000.0 / self.permitted_speed()) as u64;
        self.last_step_at = Some(now);
    }
}

impl MotionDriver for StepDirDriver<'_> {
    fn set_target(&mut self, position: i32) {
        self.target_position = position;
        self.leg_started_from = self.current_position;
        // First step of a fresh leg fires immediately.
        self.last_step_at = None;
    }

    fn distance_remaining(&self) -> i32 {
        self.target_position - self.current_position
    }

    fn advance_one_step(&mut self) {
        let towards = self.distance_remaining().signum();
        if towards == 0 {
            return;
        }

        let now = Instant::now();
        let due = match self.last_step_at {
            None => true,
            Some(last) => {
                now.saturating_duration_since(last).as_micros() >= self.step_interval_us
            }
        };
        if !due {
            return;
        }

        if towards > 0 {
            self.dir.set_high();
        } else {
            self.dir.set_low();
        }
        self.pulse();
        self.current_position += towards;
        self.reschedule(now);
    }

    fn current_position(&self) -> i32 {
        self.current_position
    }

    fn set_max_speed(&mut self, steps_per_second: f32) {
        self.max_speed = steps_per_second.max(MIN_SPEED);
    }

    fn set_acceleration(&mut self, steps_per_second_squared: f32) {
        if steps_per_second_squared > 0.0 {
            self.acceleration = steps_per_second_squared;
        }
    }

    fn reset_position(&mut self, position: i32) {
        self.current_position = position;
        self.target_position = position;
        self.leg_started_from = position;
        self.last_step_at = None;
    }
}
