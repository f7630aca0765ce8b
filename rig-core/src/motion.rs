//! Motion phase controller: scripted move-and-pause sequencing.
//!
//! The controller owns the motion context's CPU for the duration of a phase
//! pair: it commands the motion primitive, busy-waits the stepping loop
//! until the remaining distance reaches zero, and signals each settled leg
//! through the completion mailbox. Everything here is `no_std` and driver
//! agnostic so the same sequencing runs against the RP2040 stepper, the
//! emulator's simulated motor, and scripted test drivers.

use core::time::Duration;

use crate::clock::{MonotonicInstant, Timebase};
use crate::mailbox::{CompletionCode, SignalProducer};

/// Steps travelled away from the rest position on each outbound leg.
pub const TRAVEL_STEPS: i32 = 200;
/// Maximum stepping rate in steps per second.
pub const MAX_SPEED: f32 = 500.0;
/// Acceleration in steps per second squared.
pub const ACCELERATION: f32 = 250.0;
/// Dwell between legs before any escalation is applied.
pub const BASE_PAUSE: Duration = Duration::from_secs(5);
/// Fixed amount added to the dwell at every escalation point.
pub const PAUSE_INCREMENT: Duration = Duration::from_millis(1_000);
/// Number of completed phase pairs between escalation points.
pub const PAIRS_PER_INCREMENT: u32 = 5;

/// Contract of the stepper-motion primitive.
///
/// The planner behind this trait is an assumed-correct external component:
/// it accepts a target, reports how far away it still is, and moves at most
/// one step closer per `advance_one_step` invocation.
pub trait MotionDriver {
    /// Commands a new absolute target position in steps.
    fn set_target(&mut self, position: i32);

    /// Reports the signed distance from the current position to the target.
    fn distance_remaining(&self) -> i32;

    /// Advances the motor by at most one step toward the target.
    fn advance_one_step(&mut self);

    /// Returns the current absolute position in steps.
    fn current_position(&self) -> i32;

    /// Sets the maximum permitted speed in steps per second.
    fn set_max_speed(&mut self, steps_per_second: f32);

    /// Sets the acceleration in steps per second squared.
    fn set_acceleration(&mut self, steps_per_second_squared: f32);

    /// Re-declares the current physical position, without moving.
    fn reset_position(&mut self, position: i32);
}

/// Mirror for motion state the telemetry context is allowed to read.
///
/// The motion context is the only writer of both values; implementations
/// publish them to single-writer shared slots (atomics on the firmware).
pub trait StatusPublisher {
    /// Publishes the finished flag for the in-flight leg.
    fn publish_finished(&mut self, finished: bool);

    /// Publishes the run time of the most recently closed window.
    fn publish_run_time(&mut self, run_time: Duration);
}

/// Status publisher that performs no sharing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopStatusPublisher;

impl NoopStatusPublisher {
    /// Creates a new no-op status publisher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatusPublisher for NoopStatusPublisher {
    fn publish_finished(&mut self, _: bool) {}

    fn publish_run_time(&mut self, _: Duration) {}
}

/// Dwell escalation policy: the pause grows by a fixed increment at a fixed
/// cadence of completed phase pairs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PauseSchedule {
    base: Duration,
    increment: Duration,
    pairs_per_increment: u32,
}

impl PauseSchedule {
    /// Creates a schedule from its compiled constants.
    #[must_use]
    pub const fn new(base: Duration, increment: Duration, pairs_per_increment: u32) -> Self {
        Self {
            base,
            increment,
            pairs_per_increment,
        }
    }

    /// Returns the dwell to apply given how many pairs have completed.
    #[must_use]
    pub fn pause_for(&self, pairs_completed: u32) -> Duration {
        if self.pairs_per_increment == 0 {
            return self.base;
        }
        let escalations = pairs_completed / self.pairs_per_increment;
        self.base + self.increment * escalations
    }
}

/// Compiled motion parameters for the experiment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhasePlan {
    /// Outbound target in steps; the return leg mirrors it to the negative.
    pub travel_steps: i32,
    /// Maximum stepping rate handed to the driver.
    pub max_speed: f32,
    /// Acceleration handed to the driver.
    pub acceleration: f32,
    /// Dwell escalation policy.
    pub pauses: PauseSchedule,
}

impl PhasePlan {
    /// Creates a plan from explicit parameters.
    #[must_use]
    pub const fn new(
        travel_steps: i32,
        max_speed: f32,
        acceleration: f32,
        pauses: PauseSchedule,
    ) -> Self {
        Self {
            travel_steps,
            max_speed,
            acceleration,
            pauses,
        }
    }

    /// The baseline experiment: 200 steps out and back at 500 steps/s with
    /// a 5 s dwell growing 1 s every 5 pairs.
    #[must_use]
    pub const fn baseline() -> Self {
        Self::new(
            TRAVEL_STEPS,
            MAX_SPEED,
            ACCELERATION,
            PauseSchedule::new(BASE_PAUSE, PAUSE_INCREMENT, PAIRS_PER_INCREMENT),
        )
    }
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Run-time window for the in-flight leg.
#[derive(Copy, Clone, Debug)]
struct MotionWindow<I> {
    opened_at: Option<I>,
}

impl<I: MonotonicInstant> MotionWindow<I> {
    const fn closed() -> Self {
        Self { opened_at: None }
    }

    fn open(&mut self, now: I) {
        self.opened_at = Some(now);
    }

    fn close(&mut self, now: I) -> Duration {
        match self.opened_at.take() {
            Some(opened_at) => now.saturating_duration_since(opened_at),
            None => Duration::ZERO,
        }
    }
}

/// Result of one settled motion leg.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LegOutcome {
    /// Code pushed to the mailbox for this leg.
    pub code: CompletionCode,
    /// Width of the run-time window for this leg.
    pub run_time: Duration,
    /// Driver position once the leg settled.
    pub settled_position: i32,
}

/// Result of a full phase pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PhasePairSummary {
    /// Outcome of the outbound leg.
    pub outbound: LegOutcome,
    /// Outcome of the return leg.
    pub inbound: LegOutcome,
    /// Dwell applied between and after the legs of this pair.
    pub pause: Duration,
    /// Total pairs completed including this one.
    pub pairs_completed: u32,
}

/// Drives the scripted forward/pause/return/pause sequence and signals each
/// settled leg exactly once.
pub struct PhaseController<D, P, S, T>
where
    D: MotionDriver,
    P: SignalProducer,
    S: StatusPublisher,
    T: Timebase,
{
    driver: D,
    signals: P,
    status: S,
    timebase: T,
    plan: PhasePlan,
    pairs_completed: u32,
    motor_finished: bool,
    stop_requested: bool,
    window: MotionWindow<T::Instant>,
}

impl<D, P, S, T> PhaseController<D, P, S, T>
where
    D: MotionDriver,
    P: SignalProducer,
    S: StatusPublisher,
    T: Timebase,
{
    /// Creates a controller and applies the plan's motion parameters to the
    /// driver, declaring the current physical position as zero.
    pub fn new(mut driver: D, signals: P, status: S, timebase: T, plan: PhasePlan) -> Self {
        driver.set_max_speed(plan.max_speed);
        driver.set_acceleration(plan.acceleration);
        driver.reset_position(0);

        Self {
            driver,
            signals,
            status,
            timebase,
            plan,
            pairs_completed: 0,
            motor_finished: false,
            stop_requested: false,
            window: MotionWindow::closed(),
        }
    }

    /// Returns the number of completed phase pairs.
    pub fn pairs_completed(&self) -> u32 {
        self.pairs_completed
    }

    /// Returns `true` while the most recent leg settled cleanly and the
    /// next leg has not yet begun.
    pub fn motor_finished(&self) -> bool {
        self.motor_finished
    }

    /// Returns the compiled plan driving this controller.
    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Returns the mailbox producer handle.
    pub fn signals(&self) -> &P {
        &self.signals
    }

    /// Returns the motion driver handle.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns the timebase handle.
    pub fn timebase(&self) -> &T {
        &self.timebase
    }

    /// Arms a one-shot abandon of the next stepping loop.
    ///
    /// Nothing arms this in the baseline dispatch; the hook exists for
    /// forced-stop extensions, and the abandoned leg reports
    /// [`CompletionCode::Aborted`].
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Runs one full phase pair: forward leg, dwell, return leg, dwell.
    ///
    /// Pushes exactly two completion codes, one as each leg settles. If the
    /// driver never settles and no stop was requested, this blocks forever;
    /// a stalled motor is a fail-stop condition on this rig.
    pub fn run_phase_pair(&mut self) -> PhasePairSummary {
        let travel = self.plan.travel_steps;
        let pause = self.plan.pauses.pause_for(self.pairs_completed);

        let outbound = self.run_leg(travel);
        self.timebase.pause(pause);
        let inbound = self.run_leg(-travel);
        self.timebase.pause(pause);

        self.pairs_completed += 1;

        PhasePairSummary {
            outbound,
            inbound,
            pause,
            pairs_completed: self.pairs_completed,
        }
    }

    fn run_leg(&mut self, target: i32) -> LegOutcome {
        self.motor_finished = false;
        self.status.publish_finished(false);
        self.window.open(self.timebase.now());
        self.driver.set_target(target);

        while self.driver.distance_remaining() != 0 {
            if self.stop_requested {
                break;
            }
            self.driver.advance_one_step();
        }

        let settled = self.driver.distance_remaining() == 0;
        let run_time = self.window.close(self.timebase.now());
        self.motor_finished = settled;
        self.stop_requested = false;
        self.status.publish_finished(settled);
        self.status.publish_run_time(run_time);

        let code = if settled {
            CompletionCode::Completed
        } else {
            CompletionCode::Aborted
        };
        // Production is bounded to two codes per pair and drained well
        // within one telemetry tick; overflow is surfaced by the transport
        // adapter, not handled here.
        let _ = self.signals.try_push(code);

        LegOutcome {
            code,
            run_time,
            settled_position: self.driver.current_position(),
        }
    }
}
