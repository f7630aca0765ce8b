//! Telemetry aggregation: power sampling, energy windows, and the
//! notification discipline.
//!
//! The aggregator consumes one sensor reading and at most one mailbox code
//! per tick, maintains the cumulative-energy window against the shared
//! finished flag, and emits a summary exactly once per consumed completion.

use core::time::Duration;

use crate::clock::MonotonicInstant;
use crate::mailbox::CompletionCode;

/// Contract of the current/voltage sensor.
///
/// Mirrors the INA219 driver surface: a boolean bring-up and four raw
/// channels read on demand.
pub trait PowerSensor {
    /// Brings the sensor up; `true` when the device responded.
    fn initialize(&mut self) -> bool;

    /// Voltage across the shunt resistor in millivolts.
    fn shunt_millivolts(&mut self) -> f32;

    /// Voltage on the bus side in volts.
    fn bus_volts(&mut self) -> f32;

    /// Current through the shunt in milliamps.
    fn current_milliamps(&mut self) -> f32;

    /// Power register reading in milliwatts.
    fn power_milliwatts(&mut self) -> f32;

    /// Captures all four channels in one pass.
    fn sample(&mut self) -> PowerReading {
        PowerReading::new(
            self.shunt_millivolts(),
            self.bus_volts(),
            self.current_milliamps(),
            self.power_milliwatts(),
        )
    }
}

/// One sensor sample across all four raw channels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PowerReading {
    /// Shunt voltage in millivolts.
    pub shunt_millivolts: f32,
    /// Bus voltage in volts.
    pub bus_volts: f32,
    /// Current in milliamps.
    pub current_milliamps: f32,
    /// Power in milliwatts.
    pub power_milliwatts: f32,
}

impl PowerReading {
    /// Assembles a reading from the four raw channels.
    #[must_use]
    pub const fn new(
        shunt_millivolts: f32,
        bus_volts: f32,
        current_milliamps: f32,
        power_milliwatts: f32,
    ) -> Self {
        Self {
            shunt_millivolts,
            bus_volts,
            current_milliamps,
            power_milliwatts,
        }
    }

    /// Voltage at the load: the bus rail plus the shunt drop.
    #[must_use]
    pub fn load_volts(&self) -> f32 {
        self.bus_volts + self.shunt_millivolts / 1_000.0
    }
}

/// Cumulative-energy accumulator for the open motion window.
///
/// While the motor is running the window start is refreshed every tick;
/// once the finished flag is observed, each tick adds the instantaneous
/// power multiplied by the elapsed window width, in milliwatt-milliseconds.
/// That product deliberately reproduces the rig's historical accounting
/// rather than a true integral; downstream tooling parses these values.
pub struct EnergyLedger<I> {
    cumulative_milliwatt_millis: f32,
    window_started_at: Option<I>,
}

impl<I: MonotonicInstant> EnergyLedger<I> {
    /// Creates an empty ledger with no open window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cumulative_milliwatt_millis: 0.0,
            window_started_at: None,
        }
    }

    /// Folds one tick into the ledger.
    pub fn update(&mut self, motor_finished: bool, power_milliwatts: f32, now: I) {
        if motor_finished {
            if let Some(started_at) = self.window_started_at {
                let held = now.saturating_duration_since(started_at);
                self.cumulative_milliwatt_millis += power_milliwatts * millis_f32(held);
            }
        } else {
            self.window_started_at = Some(now);
        }
    }

    /// Returns the accumulated total in milliwatt-milliseconds.
    pub fn cumulative_milliwatt_millis(&self) -> f32 {
        self.cumulative_milliwatt_millis
    }

    /// Zeroes the accumulator. The window start is left alone; only the
    /// reported total resets.
    pub fn reset(&mut self) {
        self.cumulative_milliwatt_millis = 0.0;
    }
}

impl<I: MonotonicInstant> Default for EnergyLedger<I> {
    fn default() -> Self {
        Self::new()
    }
}

fn millis_f32(duration: Duration) -> f32 {
    duration.as_millis() as f32
}

/// Everything one telemetry tick observes.
#[derive(Copy, Clone, Debug)]
pub struct TickInputs<I> {
    /// The sensor sample taken this tick.
    pub reading: PowerReading,
    /// Timestamp of the sample.
    pub now: I,
    /// Mailbox code drained this tick, if any.
    pub signal: Option<CompletionCode>,
    /// Shared finished flag as published by the motion context.
    pub motor_finished: bool,
    /// Shared run time as published by the motion context.
    pub motor_run_time: Duration,
}

/// Energy and run-time report for one closed window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnergySummary {
    /// Accumulated energy figure in milliwatt-milliseconds.
    pub cumulative_milliwatt_millis: f32,
    /// Run time of the reported window.
    pub run_time: Duration,
}

/// What a tick asked the caller to log.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// `true` when a clean completion was consumed this tick.
    pub finished_event: bool,
    /// Present when the notification flag closed out a summary.
    pub summary: Option<EnergySummary>,
}

/// Per-tick bookkeeping for the telemetry context.
pub struct TelemetryAggregator<I> {
    ledger: EnergyLedger<I>,
    notified: bool,
}

impl<I: MonotonicInstant> TelemetryAggregator<I> {
    /// Creates an aggregator with an empty ledger and a clear notification
    /// flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ledger: EnergyLedger::new(),
            notified: false,
        }
    }

    /// Returns the notification flag (set between consuming a completion
    /// and emitting its summary; both happen within one tick).
    pub fn notified(&self) -> bool {
        self.notified
    }

    /// Returns the current accumulated energy figure.
    pub fn cumulative_milliwatt_millis(&self) -> f32 {
        self.ledger.cumulative_milliwatt_millis()
    }

    /// Folds one tick of inputs into the aggregator.
    ///
    /// Order matters and is fixed: drain the signal, fold the energy
    /// window, then close out the summary. A `Completed` code therefore
    /// produces its summary in the same tick it is consumed.
    pub fn observe(&mut self, inputs: TickInputs<I>) -> TickReport {
        let mut finished_event = false;
        match inputs.signal {
            Some(CompletionCode::Completed) => {
                self.notified = true;
                finished_event = true;
            }
            // An abandoned leg is consumed without a notification; there is
            // no clean window to report.
            Some(CompletionCode::Aborted) | None => {}
        }

        self.ledger.update(
            inputs.motor_finished,
            inputs.reading.power_milliwatts,
            inputs.now,
        );

        let summary = if self.notified {
            let summary = EnergySummary {
                cumulative_milliwatt_millis: self.ledger.cumulative_milliwatt_millis(),
                run_time: inputs.motor_run_time,
            };
            self.ledger.reset();
            self.notified = false;
            Some(summary)
        } else {
            None
        };

        TickReport {
            finished_event,
            summary,
        }
    }
}

impl<I: MonotonicInstant> Default for TelemetryAggregator<I> {
    fn default() -> Self {
        Self::new()
    }
}
