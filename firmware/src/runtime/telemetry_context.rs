//! Telemetry context: the core-0 sampling task.

use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::{Duration, Timer};

use rig_core::mailbox::SignalConsumer;
use rig_core::report::{self, LogSink};
use rig_core::telemetry::{PowerSensor, TelemetryAggregator, TickInputs};

use crate::console::{SerialConsole, StatusLed};
use crate::mailbox::CompletionReceiver;
use crate::sensor::Ina219;
use crate::status;
use crate::timebase::RigInstant;

/// Delay before the first serial line so a log viewer can attach.
const STARTUP_DELAY: Duration = Duration::from_secs(5);
/// Sampling cadence.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
/// Liveness pulse width during normal sampling.
const LIVENESS_PULSE: Duration = Duration::from_millis(100);
/// Pulse width of the sensor-missing degraded loop.
const DEGRADED_PULSE: Duration = Duration::from_millis(1_000);

#[embassy_executor::task]
pub async fn run(
    mut sensor: Ina219<I2c<'static, I2C0, Blocking>>,
    mut console: SerialConsole<'static>,
    mut led: StatusLed<'static>,
    mut events: CompletionReceiver<'static>,
) -> ! {
    Timer::after(STARTUP_DELAY).await;
    console.write_line("Stepper power rig started");

    if !sensor.initialize() {
        console.write_line(report::SENSOR_MISSING_LINE);
        defmt::error!("telemetry: INA219 missing, entering degraded loop");
        // Fail-stop: no retry, no reboot. The slow pulse signals the fault
        // until someone power-cycles the rig.
        loop {
            led.pulse(1, DEGRADED_PULSE).await;
        }
    }
    console.write_line(report::SENSOR_READY_LINE);

    let mut aggregator: TelemetryAggregator<RigInstant> = TelemetryAggregator::new();

    loop {
        let reading = sensor.sample();
        report::log_reading(&mut console, &reading);
        led.pulse(2, LIVENESS_PULSE).await;

        let signal = events.try_pop().unwrap_or_default();
        let tick = aggregator.observe(TickInputs {
            reading,
            now: RigInstant::now(),
            signal,
            motor_finished: status::motor_finished(),
            motor_run_time: status::motor_run_time(),
        });

        if tick.finished_event {
            report::log_finished(&mut console);
        }
        if let Some(summary) = tick.summary {
            report::log_summary(&mut console, &summary);
        }

        Timer::after(SAMPLE_INTERVAL).await;
    }
}
