#![cfg(target_os = "none")]

//! Serial console and liveness LED.
//!
//! The console carries the byte-exact telemetry line contract over UART0 at
//! 115200 baud; the LED gives a heartbeat a human can read from across the
//! bench: two quick pulses per sample, one slow pulse per degraded-loop
//! turn.

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{Blocking, Uart};
use embassy_time::{Duration, Timer};

use rig_core::report::LogSink;

/// Line-oriented serial console for the telemetry contract.
pub struct SerialConsole<'d> {
    uart: Uart<'d, UART0, Blocking>,
}

impl<'d> SerialConsole<'d> {
    /// Wraps a configured blocking UART.
    pub fn new(uart: Uart<'d, UART0, Blocking>) -> Self {
        Self { uart }
    }
}

impl LogSink for SerialConsole<'_> {
    fn write_line(&mut self, line: &str) {
        // A wedged UART cannot take the telemetry loop down with it.
        let _ = self.uart.blocking_write(line.as_bytes());
        let _ = self.uart.blocking_write(b"\r\n");
    }
}

/// On-board LED pulser.
pub struct StatusLed<'d> {
    led: Output<'d>,
}

impl<'d> StatusLed<'d> {
    /// Wraps the LED output pin.
    pub fn new(led: Output<'d>) -> Self {
        Self { led }
    }

    /// Emits `times` on/off pulses of equal width.
    pub async fn pulse(&mut self, times: u8, width: Duration) {
        for _ in 0..times {
            self.led.set_high();
            Timer::after(width).await;
            self.led.set_low();
            Timer::after(width).await;
        }
    }
}
