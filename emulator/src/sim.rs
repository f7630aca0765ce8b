//! Host-side stand-ins for the rig hardware.
//!
//! The simulated stepper, sensor, clock, and mailbox adapt the same
//! `rig-core` traits the firmware binds to the RP2040, so the emulator runs
//! the identical coordinator logic with two OS threads in place of the two
//! cores.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use rig_core::clock::{MonotonicInstant, Timebase};
use rig_core::mailbox::{
    CompletionCode, SignalConsumer, SignalPopError, SignalProducer, SignalPushError,
};
use rig_core::motion::{MotionDriver, StatusPublisher};
use rig_core::telemetry::PowerSensor;

/// Wall-clock instant for the emulated telemetry windows.
#[derive(Copy, Clone, Debug)]
pub struct EmuInstant(Instant);

impl EmuInstant {
    /// Captures the current wall-clock instant.
    pub fn now() -> Self {
        Self(Instant::now())
    }
}

impl MonotonicInstant for EmuInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

/// Wall-clock timebase with scaled-down pauses so a demo run finishes in
/// seconds rather than minutes.
pub struct ScaledTimebase {
    scale: u32,
}

impl ScaledTimebase {
    /// Creates a timebase dividing every pause by `scale`.
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }
}

impl Timebase for ScaledTimebase {
    type Instant = EmuInstant;

    fn now(&self) -> EmuInstant {
        EmuInstant::now()
    }

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration / self.scale);
    }
}

/// Stepper stand-in: one step per advance call, each taking a fixed slice
/// of wall time so run-time windows come out non-zero.
pub struct SimStepper {
    position: i32,
    target: i32,
    step_time: Duration,
}

impl SimStepper {
    /// Creates a stepper whose every step consumes `step_time`.
    pub fn new(step_time: Duration) -> Self {
        Self {
            position: 0,
            target: 0,
            step_time,
        }
    }
}

impl MotionDriver for SimStepper {
    fn set_target(&mut self, position: i32) {
        self.target = position;
    }

    fn distance_remaining(&self) -> i32 {
        self.target - self.position
    }

    fn advance_one_step(&mut self) {
        let towards = self.distance_remaining().signum();
        if towards == 0 {
            return;
        }
        thread::sleep(self.step_time);
        self.position += towards;
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn set_max_speed(&mut self, _: f32) {}

    fn set_acceleration(&mut self, _: f32) {}

    fn reset_position(&mut self, position: i32) {
        self.position = position;
        self.target = position;
    }
}

#[derive(Default)]
struct StatusInner {
    finished: AtomicBool,
    run_time_ms: AtomicU64,
}

/// Shared-slot status mirror, the emulator's analogue of the firmware
/// atomics. The motion thread is the only writer.
#[derive(Clone, Default)]
pub struct SharedStatus {
    inner: Arc<StatusInner>,
}

impl SharedStatus {
    /// Reads the finished flag.
    pub fn finished(&self) -> bool {
        self.inner.finished.load(Ordering::Relaxed)
    }

    /// Reads the last published run time.
    pub fn run_time(&self) -> Duration {
        Duration::from_millis(self.inner.run_time_ms.load(Ordering::Relaxed))
    }
}

impl StatusPublisher for SharedStatus {
    fn publish_finished(&mut self, finished: bool) {
        self.inner.finished.store(finished, Ordering::Relaxed);
    }

    fn publish_run_time(&mut self, run_time: Duration) {
        let millis = u64::try_from(run_time.as_millis()).unwrap_or(u64::MAX);
        self.inner.run_time_ms.store(millis, Ordering::Relaxed);
    }
}

/// Sensor stand-in: an elevated electrical profile while the motor runs and
/// an idle floor once it has settled.
pub struct SimSensor {
    status: SharedStatus,
}

impl SimSensor {
    /// Creates a sensor following the shared motor state.
    pub fn new(status: SharedStatus) -> Self {
        Self { status }
    }

    fn running(&self) -> bool {
        !self.status.finished()
    }
}

impl PowerSensor for SimSensor {
    fn initialize(&mut self) -> bool {
        true
    }

    fn shunt_millivolts(&mut self) -> f32 {
        if self.running() { 2.5 } else { 0.4 }
    }

    fn bus_volts(&mut self) -> f32 {
        if self.running() { 11.93 } else { 12.02 }
    }

    fn current_milliamps(&mut self) -> f32 {
        if self.running() { 124.0 } else { 21.0 }
    }

    fn power_milliwatts(&mut self) -> f32 {
        if self.running() { 1_480.0 } else { 250.0 }
    }
}

/// Producer adapter over the bounded inter-thread channel.
pub struct MailboxSender {
    sender: SyncSender<u32>,
}

impl MailboxSender {
    /// Wraps the sending half of the mailbox channel.
    pub fn new(sender: SyncSender<u32>) -> Self {
        Self { sender }
    }
}

impl SignalProducer for MailboxSender {
    type Error = ();

    fn try_push(&mut self, code: CompletionCode) -> Result<(), SignalPushError<Self::Error>> {
        match self.sender.try_send(code.to_raw()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SignalPushError::Full),
            Err(TrySendError::Disconnected(_)) => Err(SignalPushError::Other(())),
        }
    }
}

/// Consumer adapter over the bounded inter-thread channel.
pub struct MailboxReceiver {
    receiver: Receiver<u32>,
}

impl MailboxReceiver {
    /// Wraps the receiving half of the mailbox channel.
    pub fn new(receiver: Receiver<u32>) -> Self {
        Self { receiver }
    }
}

impl SignalConsumer for MailboxReceiver {
    type Error = ();

    fn try_pop(&mut self) -> Result<Option<CompletionCode>, SignalPopError<Self::Error>> {
        match self.receiver.try_recv() {
            Ok(raw) => Ok(CompletionCode::from_raw(raw)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SignalPopError::Disconnected),
        }
    }
}
