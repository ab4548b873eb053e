//! Driver for the M5Stack 8Servo unit.
//!
//! Eight pins, each independently configurable as digital IO, ADC input,
//! servo output, RGB LED (WS2812) or PWM output. Every per-pin register
//! block is indexed by pin number; multi-byte values are little-endian
//! except the RGB triplet, which is stored red first.

use embedded_hal::i2c::I2c;

use crate::codec::{self, AdcResolution, Endian};
use crate::driver::{Address, RegisterDriver};
use crate::error::{Argument, Error};
use crate::probe::{self, AddressList, IdRegister, Identity, Match};

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

pub const MODE: u8 = 0x00;
pub const OUTPUT_CTL: u8 = 0x10;
pub const DIGITAL_INPUT: u8 = 0x20;
pub const ANALOG_INPUT_8BIT: u8 = 0x30;
/// Two bytes per pin.
pub const ANALOG_INPUT_12BIT: u8 = 0x40;
pub const SERVO_ANGLE: u8 = 0x50;
/// Two bytes per pin.
pub const SERVO_PULSE: u8 = 0x60;
/// Three bytes per pin.
pub const RGB: u8 = 0x70;
pub const PWM: u8 = 0x90;
/// Servo supply current in amperes (f32).
pub const CURRENT: u8 = 0xA0;
pub const JUMP_TO_BOOTLOADER: u8 = 0xFD;
pub const FIRMWARE_VERSION: u8 = 0xFE;
pub const I2C_ADDRESS: u8 = 0xFF;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const PIN_COUNT: u8 = 8;
pub const MAX_ANGLE: u8 = 180;
/// Servo pulse width range in microseconds.
pub const PULSE_RANGE: core::ops::RangeInclusive<u16> = 500..=2500;
pub const MAX_PWM_DUTY: u8 = 100;

/// Factory default bus address.
pub const DEFAULT_ADDRESS: Address = Address::fixed(0x25);

/// Firmware version readable and address register echoing the bus address.
pub const IDENTITY: Identity = Identity {
    name: "M5 8Servo",
    registers: &[
        IdRegister {
            register: FIRMWARE_VERSION,
            expected: Match::Any,
        },
        IdRegister {
            register: I2C_ADDRESS,
            expected: Match::BusAddress,
        },
    ],
};

/// Function assigned to a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExtIoMode {
    DigitalInput = 0,
    DigitalOutput = 1,
    AdcInput = 2,
    ServoCtl = 3,
    RgbLed = 4,
    Pwm = 5,
}

impl ExtIoMode {
    /// Decode a mode register value. `None` for an undocumented code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => ExtIoMode::DigitalInput,
            1 => ExtIoMode::DigitalOutput,
            2 => ExtIoMode::AdcInput,
            3 => ExtIoMode::ServoCtl,
            4 => ExtIoMode::RgbLed,
            5 => ExtIoMode::Pwm,
            _ => return None,
        })
    }
}

/// Construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub address: Address,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
        }
    }
}

/// Handle to one 8Servo unit.
///
/// Pin arguments outside `0..=7` fail with [`Argument::Channel`] before any
/// transfer.
pub struct ServoUnit<I2C> {
    driver: RegisterDriver<I2C>,
}

impl<I2C> ServoUnit<I2C>
where
    I2C: I2c,
{
    /// Open the unit at `config.address` after checking its identity.
    pub fn new(i2c: I2C, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut driver = RegisterDriver::new(i2c, config.address);
        driver.expect_identity(&IDENTITY)?;
        Ok(Self { driver })
    }

    /// Scan the whole bus for 8Servo units.
    pub fn detect(i2c: &mut I2C) -> AddressList {
        probe::scan_all(i2c, &IDENTITY)
    }

    /// The address this handle targets.
    pub fn address(&self) -> Address {
        self.driver.address()
    }

    /// Give back the bus handle.
    pub fn release(self) -> I2C {
        self.driver.release()
    }

    // -----------------------------------------------------------------------
    // Pin modes
    // -----------------------------------------------------------------------

    /// Assign `mode` to all eight pins in one write.
    pub fn set_all_pin_mode(&mut self, mode: ExtIoMode) -> Result<(), Error<I2C::Error>> {
        self.driver
            .write_bytes(MODE, &[mode as u8; PIN_COUNT as usize])
    }

    /// Assign `mode` to one pin.
    pub fn set_pin_mode(&mut self, pin: u8, mode: ExtIoMode) -> Result<(), Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        self.driver.write_u8(MODE + pin, mode as u8)
    }

    /// `None` if the unit reports an undocumented mode code.
    pub fn pin_mode(&mut self, pin: u8) -> Result<Option<ExtIoMode>, Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        Ok(ExtIoMode::from_code(self.driver.read_u8(MODE + pin)?))
    }

    // -----------------------------------------------------------------------
    // Digital and analog IO
    // -----------------------------------------------------------------------

    /// Drive a pin in digital output mode.
    pub fn set_digital_output(&mut self, pin: u8, high: bool) -> Result<(), Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        self.driver.write_u8(OUTPUT_CTL + pin, u8::from(high))
    }

    /// Level of a pin in digital input mode.
    pub fn digital_input(&mut self, pin: u8) -> Result<bool, Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        Ok(self.driver.read_u8(DIGITAL_INPUT + pin)? != 0)
    }

    /// ADC reading of a pin in analog input mode.
    pub fn analog_input(
        &mut self,
        pin: u8,
        resolution: AdcResolution,
    ) -> Result<u16, Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        match resolution {
            AdcResolution::Bits8 => self.driver.read_u8(ANALOG_INPUT_8BIT + pin).map(u16::from),
            AdcResolution::Bits12 => self
                .driver
                .read_u16(ANALOG_INPUT_12BIT + 2 * pin, Endian::Little),
        }
    }

    // -----------------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------------

    /// Servo angle in degrees, `0..=180`.
    pub fn set_servo_angle(&mut self, pin: u8, angle: u8) -> Result<(), Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        if angle > MAX_ANGLE {
            return Err(Argument::Angle.into());
        }
        self.driver.write_u8(SERVO_ANGLE + pin, angle)
    }

    /// Servo pulse width in microseconds, `500..=2500`.
    pub fn set_servo_pulse(&mut self, pin: u8, pulse_us: u16) -> Result<(), Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        if !PULSE_RANGE.contains(&pulse_us) {
            return Err(Argument::Pulse.into());
        }
        self.driver
            .write_u16(SERVO_PULSE + 2 * pin, pulse_us, Endian::Little)
    }

    /// LED colour as `0xRRGGBB`.
    pub fn set_led_color(&mut self, pin: u8, color: u32) -> Result<(), Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        let mut rgb = [0u8; 3];
        codec::encode_unsigned(color, &mut rgb, Endian::Big)?;
        self.driver.write_bytes(RGB + 3 * pin, &rgb)
    }

    /// PWM duty cycle in percent, `0..=100`.
    pub fn set_pwm(&mut self, pin: u8, duty: u8) -> Result<(), Error<I2C::Error>> {
        let pin = check_pin(pin)?;
        if duty > MAX_PWM_DUTY {
            return Err(Argument::DutyCycle.into());
        }
        self.driver.write_u8(PWM + pin, duty)
    }

    // -----------------------------------------------------------------------
    // Telemetry, firmware and addressing
    // -----------------------------------------------------------------------

    /// Servo supply current in amperes.
    pub fn servo_current(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.driver.read_f32_le(CURRENT)
    }

    /// Firmware revision byte.
    pub fn firmware_version(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.driver.read_u8(FIRMWARE_VERSION)
    }

    /// Address the unit reports for itself.
    pub fn i2c_address(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.driver.read_u8(I2C_ADDRESS)
    }

    /// Program a new bus address and retarget this handle to it.
    pub fn set_address(&mut self, address: Address) -> Result<(), Error<I2C::Error>> {
        self.driver.set_address(I2C_ADDRESS, address)
    }

    /// Reboot the unit into its firmware bootloader.
    pub fn jump_bootloader(&mut self) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(JUMP_TO_BOOTLOADER, 1)
    }
}

fn check_pin(pin: u8) -> Result<u8, Argument> {
    if pin < PIN_COUNT {
        Ok(pin)
    } else {
        Err(Argument::Channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes() {
        for code in 0..=5 {
            let mode = ExtIoMode::from_code(code).unwrap();
            assert_eq!(mode as u8, code);
        }
        assert_eq!(ExtIoMode::from_code(6), None);
    }

    #[test]
    fn pin_range() {
        assert_eq!(check_pin(0), Ok(0));
        assert_eq!(check_pin(7), Ok(7));
        assert_eq!(check_pin(8), Err(Argument::Channel));
    }
}
