//! Serial report rendering.
//!
//! The logging scripts on the host side parse these lines with regular
//! expressions, so the labels, padding, and two-decimal formatting are part
//! of the external contract and must not drift.

use core::fmt;
use core::fmt::Write as _;

use heapless::String;

use crate::telemetry::{EnergySummary, PowerReading};

/// Upper bound for one rendered report line.
pub const MAX_LINE_LEN: usize = 64;

/// One rendered line of serial output.
pub type ReportLine = String<MAX_LINE_LEN>;

/// Event line emitted when a clean completion is consumed.
pub const MOTOR_FINISHED_LINE: &str = "Motor has finished moving.";
/// Fail-stop line emitted when the sensor does not respond at bring-up.
pub const SENSOR_MISSING_LINE: &str = "Failed to find INA219 chip";
/// Banner emitted once the sensor is up.
pub const SENSOR_READY_LINE: &str = "Measuring voltage and current with INA219 ...";

/// Line-oriented text sink for the serial contract.
pub trait LogSink {
    /// Writes one line; the sink supplies the terminator.
    fn write_line(&mut self, line: &str);
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line);
    }
}

fn render(args: fmt::Arguments<'_>) -> ReportLine {
    let mut line = ReportLine::new();
    // Every contract line fits MAX_LINE_LEN; an overlong value truncates
    // rather than failing the tick.
    let _ = line.write_fmt(args);
    line
}

/// Writes the five labelled reading lines followed by a blank separator.
pub fn log_reading<S: LogSink + ?Sized>(sink: &mut S, reading: &PowerReading) {
    sink.write_line(&render(format_args!(
        "Bus Voltage:   {:.2} V",
        reading.bus_volts
    )));
    sink.write_line(&render(format_args!(
        "Shunt Voltage: {:.2} mV",
        reading.shunt_millivolts
    )));
    sink.write_line(&render(format_args!(
        "Load Voltage:  {:.2} V",
        reading.load_volts()
    )));
    sink.write_line(&render(format_args!(
        "Current:       {:.2} mA",
        reading.current_milliamps
    )));
    sink.write_line(&render(format_args!(
        "Power:         {:.2} mW",
        reading.power_milliwatts
    )));
    sink.write_line("");
}

/// Writes the completion event line.
pub fn log_finished<S: LogSink + ?Sized>(sink: &mut S) {
    sink.write_line(MOTOR_FINISHED_LINE);
}

/// Writes the cumulative energy and run-time summary lines.
pub fn log_summary<S: LogSink + ?Sized>(sink: &mut S, summary: &EnergySummary) {
    sink.write_line(&render(format_args!(
        "Cumulative Power: {:.2} mJ",
        summary.cumulative_milliwatt_millis
    )));
    sink.write_line(&render(format_args!(
        "Motor Run Time: {} ms",
        summary.run_time.as_millis()
    )));
}

/// Renders one reading as the compact CSV record the data-logging tooling
/// appends to its capture files: `bus_V,shunt_mV,load_V,current_mA,power_mW`.
#[must_use]
pub fn csv_record(reading: &PowerReading) -> ReportLine {
    render(format_args!(
        "{:.2},{:.2},{:.2},{:.2},{:.2}",
        reading.bus_volts,
        reading.shunt_millivolts,
        reading.load_volts(),
        reading.current_milliamps,
        reading.power_milliwatts
    ))
}
