#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! INA219 current/power monitor driver.
//!
//! Register-level driver over the blocking `embedded-hal` I2C trait, fixed
//! to the 32 V / 2 A calibration the rig's shunt is wired for. The driver
//! is generic over the bus so the conversions are testable on the host; a
//! read failure after bring-up degrades to a 0.0 reading with a diagnostic
//! warning rather than unwinding the telemetry loop.

use embedded_hal::i2c::I2c;

use rig_core::telemetry::PowerSensor;

/// Default I2C address with the A0/A1 straps low.
pub const DEFAULT_ADDRESS: u8 = 0x40;

const REG_CONFIG: u8 = 0x00;
const REG_SHUNT_VOLTAGE: u8 = 0x01;
const REG_BUS_VOLTAGE: u8 = 0x02;
const REG_POWER: u8 = 0x03;
const REG_CURRENT: u8 = 0x04;
const REG_CALIBRATION: u8 = 0x05;

/// 32 V bus range, ±320 mV shunt gain, 12-bit conversions, continuous
/// shunt-and-bus sampling.
const CONFIG_32V_2A: u16 = 0x399F;
/// Calibration word for a 0.1 Ω shunt at the 2 A range.
const CALIBRATION_32V_2A: u16 = 4_096;
/// Current register LSB in milliamps at that calibration.
const CURRENT_LSB_MA: f32 = 0.1;
/// Power register LSB in milliwatts at that calibration.
const POWER_LSB_MW: f32 = 2.0;
/// Shunt register LSB in millivolts.
const SHUNT_LSB_MV: f32 = 0.01;
/// Bus register LSB in volts; the register pads three status bits low.
const BUS_LSB_V: f32 = 0.004;

/// INA219 driver bound to a blocking I2C bus.
pub struct Ina219<BUS> {
    bus: BUS,
    address: u8,
}

impl<BUS: I2c> Ina219<BUS> {
    /// Creates a driver at the default address.
    pub fn new(bus: BUS) -> Self {
        Self::with_address(bus, DEFAULT_ADDRESS)
    }

    /// Creates a driver at an explicit strap address.
    pub fn with_address(bus: BUS, address: u8) -> Self {
        Self { bus, address }
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), BUS::Error> {
        let bytes = value.to_be_bytes();
        self.bus.write(self.address, &[register, bytes[0], bytes[1]])
    }

    fn read_register(&mut self, register: u8) -> Result<u16, BUS::Error> {
        let mut raw = [0u8; 2];
        self.bus.write_read(self.address, &[register], &mut raw)?;
        Ok(u16::from_be_bytes(raw))
    }

    fn read_scaled(&mut self, register: u8, scale: impl FnOnce(u16) -> f32) -> f32 {
        match self.read_register(register) {
            Ok(raw) => scale(raw),
            Err(_) => {
                warn_read_failed(register);
                0.0
            }
        }
    }
}

impl<BUS: I2c> PowerSensor for Ina219<BUS> {
    fn initialize(&mut self) -> bool {
        let brought_up = self
            .write_register(REG_CALIBRATION, CALIBRATION_32V_2A)
            .and_then(|()| self.write_register(REG_CONFIG, CONFIG_32V_2A))
            .and_then(|()| self.read_register(REG_CONFIG));

        matches!(brought_up, Ok(config) if config == CONFIG_32V_2A)
    }

    fn shunt_millivolts(&mut self) -> f32 {
        self.read_scaled(REG_SHUNT_VOLTAGE, |raw| {
            f32::from(raw as i16) * SHUNT_LSB_MV
        })
    }

    fn bus_volts(&mut self) -> f32 {
        self.read_scaled(REG_BUS_VOLTAGE, |raw| f32::from(raw >> 3) * BUS_LSB_V)
    }

    fn current_milliamps(&mut self) -> f32 {
        self.read_scaled(REG_CURRENT, |raw| f32::from(raw as i16) * CURRENT_LSB_MA)
    }

    fn power_milliwatts(&mut self) -> f32 {
        self.read_scaled(REG_POWER, |raw| f32::from(raw) * POWER_LSB_MW)
    }
}

#[cfg(target_os = "none")]
fn warn_read_failed(register: u8) {
    defmt::warn!("ina219: read of register {=u8} failed", register);
}

#[cfg(not(target_os = "none"))]
fn warn_read_failed(_: u8) {}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    use super::*;

    /// Register-file bus double with a settable failure mode.
    struct ScriptedBus {
        registers: [u16; 6],
        pointer: usize,
        fail: bool,
    }

    impl ScriptedBus {
        fn new() -> Self {
            Self {
                registers: [0; 6],
                pointer: 0,
                fail: false,
            }
        }
    }

    impl ErrorType for ScriptedBus {
        type Error = ErrorKind;
    }

    impl I2c for ScriptedBus {
        fn transaction(
            &mut self,
            _address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }

            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        self.pointer = usize::from(bytes[0]);
                        if bytes.len() == 3 {
                            self.registers[self.pointer] =
                                u16::from_be_bytes([bytes[1], bytes[2]]);
                        }
                    }
                    Operation::Read(buffer) => {
                        buffer
                            .copy_from_slice(&self.registers[self.pointer].to_be_bytes());
                    }
                }
            }

            Ok(())
        }
    }

    #[test]
    fn initialize_programs_calibration_and_config() {
        let mut sensor = Ina219::new(ScriptedBus::new());

        assert!(sensor.initialize());

        let bus = &sensor.bus;
        assert_eq!(bus.registers[usize::from(REG_CALIBRATION)], 4_096);
        assert_eq!(bus.registers[usize::from(REG_CONFIG)], 0x399F);
    }

    #[test]
    fn initialize_reports_a_missing_chip() {
        let mut bus = ScriptedBus::new();
        bus.fail = true;

        let mut sensor = Ina219::new(bus);
        assert!(!sensor.initialize());
    }

    fn close(actual: f32, expected: f32) -> bool {
        (actual - expected).abs() < 1e-4
    }

    #[test]
    fn channels_scale_with_the_fixed_calibration() {
        let mut bus = ScriptedBus::new();
        bus.registers[usize::from(REG_SHUNT_VOLTAGE)] = 250;
        bus.registers[usize::from(REG_BUS_VOLTAGE)] = 3_000 << 3;
        bus.registers[usize::from(REG_CURRENT)] = 1_234;
        bus.registers[usize::from(REG_POWER)] = 740;

        let mut sensor = Ina219::new(bus);
        assert!(close(sensor.shunt_millivolts(), 2.5));
        assert!(close(sensor.bus_volts(), 12.0));
        assert!(close(sensor.current_milliamps(), 123.4));
        assert!(close(sensor.power_milliwatts(), 1_480.0));
    }

    #[test]
    fn negative_shunt_readings_keep_their_sign() {
        let mut bus = ScriptedBus::new();
        bus.registers[usize::from(REG_SHUNT_VOLTAGE)] = (-100i16) as u16;

        let mut sensor = Ina219::new(bus);
        assert!(close(sensor.shunt_millivolts(), -1.0));
    }

    #[test]
    fn failed_reads_degrade_to_zero() {
        let mut bus = ScriptedBus::new();
        bus.registers[usize::from(REG_POWER)] = 740;
        bus.fail = true;

        let mut sensor = Ina219::new(bus);
        assert_eq!(sensor.power_milliwatts(), 0.0);
    }
}
