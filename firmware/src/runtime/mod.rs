//! Core bring-up: motion on core 1, telemetry on core 0.
//!
//! Core 0 initializes the HAL, hands the motor pins to core 1, and then
//! runs the telemetry task under the Embassy executor. Core 1 never runs an
//! executor at all: the motion context is a plain blocking loop that owns
//! its core, mirroring the per-core `setup`/`loop` split this rig has
//! always had. The only state crossing the boundary is the completion
//! mailbox and the two status slots.

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::multicore::{Stack, spawn_core1};
use embassy_rp::uart::{self, Uart};
use embassy_sync::channel::Channel;
use static_cell::StaticCell;

use crate::console::{SerialConsole, StatusLed};
use crate::mailbox::{CompletionReceiver, CompletionSender, MotionEventQueue};
use crate::sensor::Ina219;
use crate::stepper::StepDirDriver;

mod motion_context;
mod telemetry_context;

/// Completion mailbox crossing from core 1 to core 0.
static MOTION_EVENTS: MotionEventQueue = Channel::new();

static CORE1_STACK: StaticCell<Stack<4096>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let step = Output::new(p.PIN_3, Level::Low);
    let dir = Output::new(p.PIN_2, Level::Low);
    let stack = CORE1_STACK.init(Stack::new());
    spawn_core1(p.CORE1, stack, move || {
        let stepper = StepDirDriver::new(step, dir);
        motion_context::run(stepper, CompletionSender::new(MOTION_EVENTS.sender()))
    });

    let sensor = Ina219::new(I2c::new_blocking(
        p.I2C0,
        p.PIN_5,
        p.PIN_4,
        i2c::Config::default(),
    ));

    let mut serial_config = uart::Config::default();
    serial_config.baudrate = 115_200;
    let console = SerialConsole::new(Uart::new_blocking(
        p.UART0,
        p.PIN_0,
        p.PIN_1,
        serial_config,
    ));

    let led = StatusLed::new(Output::new(p.PIN_25, Level::Low));

    spawner
        .spawn(telemetry_context::run(
            sensor,
            console,
            led,
            CompletionReceiver::new(MOTION_EVENTS.receiver()),
        ))
        .expect("failed to spawn telemetry task");

    core::future::pending::<()>().await;
}
