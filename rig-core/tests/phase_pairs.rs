use core::cell::Cell;
use core::time::Duration;

use rig_core::clock::{MonotonicInstant, Timebase};
use rig_core::mailbox::{CompletionCode, SignalProducer, SignalPushError};
use rig_core::motion::{
    MotionDriver, NoopStatusPublisher, PauseSchedule, PhaseController, PhasePlan,
};

/// Quantum the stub clock advances on every observation.
const QUANTUM_MS: u64 = 25;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct MillisInstant(u64);

impl MonotonicInstant for MillisInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Stepper stand-in that closes exactly one step per advance call.
struct ScriptedStepper {
    position: i32,
    target: i32,
    max_speed: f32,
    acceleration: f32,
}

impl ScriptedStepper {
    fn new() -> Self {
        Self {
            position: 55,
            target: 55,
            max_speed: 0.0,
            acceleration: 0.0,
        }
    }
}

impl MotionDriver for ScriptedStepper {
    fn set_target(&mut self, position: i32) {
        self.target = position;
    }

    fn distance_remaining(&self) -> i32 {
        self.target - self.position
    }

    fn advance_one_step(&mut self) {
        self.position += self.distance_remaining().signum();
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn set_max_speed(&mut self, steps_per_second: f32) {
        self.max_speed = steps_per_second;
    }

    fn set_acceleration(&mut self, steps_per_second_squared: f32) {
        self.acceleration = steps_per_second_squared;
    }

    fn reset_position(&mut self, position: i32) {
        self.position = position;
        self.target = position;
    }
}

/// Clock that advances one quantum per observation and jumps across pauses.
#[derive(Default)]
struct StubTimebase {
    now_ms: Cell<u64>,
    pauses: Vec<Duration>,
}

impl Timebase for StubTimebase {
    type Instant = MillisInstant;

    fn now(&self) -> MillisInstant {
        let now = self.now_ms.get();
        self.now_ms.set(now + QUANTUM_MS);
        MillisInstant(now)
    }

    fn pause(&mut self, duration: Duration) {
        self.pauses.push(duration);
        let millis = u64::try_from(duration.as_millis()).unwrap();
        self.now_ms.set(self.now_ms.get() + millis);
    }
}

/// Producer that records every pushed code and never fills up.
#[derive(Default)]
struct RecordingMailbox {
    pushed: Vec<CompletionCode>,
}

impl SignalProducer for RecordingMailbox {
    type Error = ();

    fn try_push(&mut self, code: CompletionCode) -> Result<(), SignalPushError<Self::Error>> {
        self.pushed.push(code);
        Ok(())
    }
}

fn quick_plan() -> PhasePlan {
    PhasePlan::new(
        8,
        500.0,
        250.0,
        PauseSchedule::new(
            Duration::from_secs(5),
            Duration::from_millis(1_000),
            5,
        ),
    )
}

fn controller() -> PhaseController<ScriptedStepper, RecordingMailbox, NoopStatusPublisher, StubTimebase>
{
    PhaseController::new(
        ScriptedStepper::new(),
        RecordingMailbox::default(),
        NoopStatusPublisher::new(),
        StubTimebase::default(),
        quick_plan(),
    )
}

#[test]
fn construction_applies_the_plan_to_the_driver() {
    let controller = controller();
    let driver = controller.driver();

    assert_eq!(driver.max_speed, 500.0);
    assert_eq!(driver.acceleration, 250.0);
    assert_eq!(driver.current_position(), 0);
}

#[test]
fn every_phase_pair_pushes_exactly_two_codes() {
    let mut controller = controller();

    for pairs in 1..=7usize {
        controller.run_phase_pair();
        assert_eq!(controller.signals().pushed.len(), pairs * 2);
    }

    assert_eq!(controller.pairs_completed(), 7);
    assert!(
        controller
            .signals()
            .pushed
            .iter()
            .all(|code| *code == CompletionCode::Completed)
    );
}

#[test]
fn legs_settle_at_the_plan_targets() {
    let mut controller = controller();

    let summary = controller.run_phase_pair();

    assert_eq!(summary.outbound.code, CompletionCode::Completed);
    assert_eq!(summary.outbound.settled_position, 8);
    assert_eq!(summary.inbound.code, CompletionCode::Completed);
    assert_eq!(summary.inbound.settled_position, -8);
    assert!(controller.motor_finished());
}

#[test]
fn run_time_windows_span_the_stepping_loop() {
    let mut controller = controller();

    let summary = controller.run_phase_pair();

    // The stub clock is observed once opening and once closing each window.
    assert_eq!(summary.outbound.run_time, Duration::from_millis(QUANTUM_MS));
    assert_eq!(summary.inbound.run_time, Duration::from_millis(QUANTUM_MS));
}

#[test]
fn pause_escalates_after_every_fifth_pair() {
    let mut controller = controller();
    let mut pauses = Vec::new();

    for _ in 0..11 {
        pauses.push(controller.run_phase_pair().pause);
    }

    assert_eq!(pauses[0], Duration::from_secs(5));
    assert_eq!(pauses[4], Duration::from_secs(5));
    assert_eq!(pauses[5], Duration::from_secs(6));
    assert_eq!(pauses[9], Duration::from_secs(6));
    assert_eq!(pauses[10], Duration::from_secs(7));
}

#[test]
fn both_pair_pauses_use_the_escalated_dwell() {
    let mut controller = controller();

    for _ in 0..6 {
        controller.run_phase_pair();
    }

    // Two dwells per pair: five base pairs, then one escalated pair.
    let recorded = &controller.timebase().pauses;
    assert_eq!(recorded.len(), 12);
    assert!(recorded[..10].iter().all(|p| *p == Duration::from_secs(5)));
    assert!(recorded[10..].iter().all(|p| *p == Duration::from_secs(6)));
}

#[test]
fn forced_stop_abandons_one_leg_and_reports_aborted() {
    let mut controller = controller();
    controller.request_stop();

    let summary = controller.run_phase_pair();

    assert_eq!(summary.outbound.code, CompletionCode::Aborted);
    assert_eq!(summary.outbound.settled_position, 0);
    // The stop is one-shot: the return leg runs normally.
    assert_eq!(summary.inbound.code, CompletionCode::Completed);
    assert_eq!(
        controller.signals().pushed,
        [CompletionCode::Aborted, CompletionCode::Completed]
    );
}
