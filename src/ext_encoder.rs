//! Driver for the M5Stack Ext.Encoder unit.
//!
//! A rotary encoder with an on-board counter that also converts pulses to a
//! travelled distance from a configured wheel perimeter. All multi-byte
//! registers are little-endian.

use embedded_hal::i2c::I2c;

use crate::codec::Endian;
use crate::driver::{Address, RegisterDriver};
use crate::error::Error;
use crate::probe::{self, AddressList, IdRegister, Identity, Match};

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

/// Signed pulse count (i32).
pub const ENCODER: u8 = 0x00;
/// Travelled distance (u32).
pub const METER: u8 = 0x10;
/// Travelled distance as ASCII text, NUL padded.
pub const METER_STRING: u8 = 0x20;
/// Write `1` to clear the counter.
pub const RESET: u8 = 0x30;
/// Wheel perimeter (u32).
pub const PERIMETER: u8 = 0x40;
/// Pulses per revolution (u32).
pub const PULSE: u8 = 0x50;
/// Counter value the zero mode resets to (u32).
pub const ZERO_PULSE_VALUE: u8 = 0x60;
pub const ZERO_MODE: u8 = 0x70;
pub const FIRMWARE_VERSION: u8 = 0xFE;
pub const I2C_ADDRESS: u8 = 0xFF;

/// Width of the [`METER_STRING`] register.
pub const METER_STRING_LEN: usize = 9;

/// Factory default bus address.
pub const DEFAULT_ADDRESS: Address = Address::fixed(0x59);

/// Firmware version readable and address register echoing the bus address.
pub const IDENTITY: Identity = Identity {
    name: "M5 Ext.Encoder",
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

/// Raw contents of the meter string register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterString(pub [u8; METER_STRING_LEN]);

impl MeterString {
    /// The text with trailing NUL padding removed, or `None` if the unit
    /// returned non-UTF-8 bytes.
    pub fn as_str(&self) -> Option<&str> {
        let end = self
            .0
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(METER_STRING_LEN);
        core::str::from_utf8(&self.0[..end]).ok()
    }
}

/// Handle to one Ext.Encoder unit.
pub struct ExtEncoder<I2C> {
    driver: RegisterDriver<I2C>,
}

impl<I2C> ExtEncoder<I2C>
where
    I2C: I2c,
{
    /// Open the unit at `config.address`.
    ///
    /// # Errors
    /// * [`Error::DeviceNotDetected`] if the identification check fails
    pub fn new(i2c: I2C, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut driver = RegisterDriver::new(i2c, config.address);
        driver.expect_identity(&IDENTITY)?;
        Ok(Self { driver })
    }

    /// Scan the whole bus for Ext.Encoder units.
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
    // Counter
    // -----------------------------------------------------------------------

    /// Signed pulse count since the last reset.
    pub fn encoder_value(&mut self) -> Result<i32, Error<I2C::Error>> {
        self.driver.read_i32(ENCODER, Endian::Little)
    }

    /// Zero the pulse counter.
    pub fn reset_encoder(&mut self) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(RESET, 1)
    }

    /// Distance travelled, as computed by the unit from perimeter and pulses.
    pub fn meter_value(&mut self) -> Result<u32, Error<I2C::Error>> {
        self.driver.read_u32(METER, Endian::Little)
    }

    /// The distance as the unit's own decimal text.
    pub fn meter_string(&mut self) -> Result<MeterString, Error<I2C::Error>> {
        let mut raw = [0u8; METER_STRING_LEN];
        self.driver.read_bytes(METER_STRING, &mut raw)?;
        Ok(MeterString(raw))
    }

    // -----------------------------------------------------------------------
    // Calibration
    // -----------------------------------------------------------------------

    /// Wheel perimeter used for the distance calculation.
    pub fn perimeter(&mut self) -> Result<u32, Error<I2C::Error>> {
        self.driver.read_u32(PERIMETER, Endian::Little)
    }

    /// Store a new wheel perimeter.
    pub fn set_perimeter(&mut self, perimeter: u32) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u32(PERIMETER, perimeter, Endian::Little)
    }

    /// Pulses per wheel revolution.
    pub fn pulse(&mut self) -> Result<u32, Error<I2C::Error>> {
        self.driver.read_u32(PULSE, Endian::Little)
    }

    /// Store the pulses per revolution.
    pub fn set_pulse(&mut self, pulse: u32) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u32(PULSE, pulse, Endian::Little)
    }

    /// Count the unit resets to when zeroed.
    pub fn zero_pulse_value(&mut self) -> Result<u32, Error<I2C::Error>> {
        self.driver.read_u32(ZERO_PULSE_VALUE, Endian::Little)
    }

    /// Store the count the unit resets to.
    pub fn set_zero_pulse_value(&mut self, value: u32) -> Result<(), Error<I2C::Error>> {
        self.driver
            .write_u32(ZERO_PULSE_VALUE, value, Endian::Little)
    }

    /// Select how the unit zeroes its counter. The code is passed through unchecked.
    pub fn set_zero_mode(&mut self, mode: u8) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(ZERO_MODE, mode)
    }

    // -----------------------------------------------------------------------
    // Firmware and addressing
    // -----------------------------------------------------------------------

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
}
