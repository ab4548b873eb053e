//! Driver for the M5Stack I2C ultrasonic range finder (RCWL-9620).
//!
//! The unit has no register map: writing `0x01` starts a measurement and a
//! bare 3-byte read returns the echo distance in micrometres, big-endian.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::driver::{Address, RegisterDriver};
use crate::error::Error;
use crate::probe::{self, AddressList, Identity};

/// Measurement trigger command.
pub const TRIGGER: u8 = 0x01;

/// Time from trigger until the result is readable.
pub const MEASUREMENT_MS: u32 = 20;

/// Upper limit of the sensor's range; larger readings are clamped.
pub const MAX_DISTANCE_MM: f32 = 4500.0;

/// Factory address.
pub const DEFAULT_ADDRESS: Address = Address::fixed(0x57);

/// No identification registers; presence is an acknowledged read.
pub const IDENTITY: Identity = Identity {
    name: "M5 Ultrasonic",
    registers: &[],
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

pub struct Ultrasonic<I2C: I2c, D: DelayNs> {
    driver: RegisterDriver<I2C>,
    delay: D,
}

impl<I2C, D> Ultrasonic<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut driver = RegisterDriver::new(i2c, config.address);
        driver.expect_identity(&IDENTITY)?;
        Ok(Self { driver, delay })
    }

    /// Scan the whole bus for anything that acknowledges a read.
    pub fn detect(i2c: &mut I2C) -> AddressList {
        probe::scan_all(i2c, &IDENTITY)
    }

    pub fn address(&self) -> Address {
        self.driver.address()
    }

    pub fn release(self) -> I2C {
        self.driver.release()
    }

    /// Trigger one measurement and return the three result bytes.
    pub fn raw_measurement(&mut self) -> Result<[u8; 3], Error<I2C::Error>> {
        self.driver.transfer(&[TRIGGER], &mut [])?;
        self.delay.delay_ms(MEASUREMENT_MS);

        let mut raw = [0u8; 3];
        self.driver.transfer(&[], &mut raw)?;
        Ok(raw)
    }

    /// Distance to the nearest echo in millimetres, at most
    /// [`MAX_DISTANCE_MM`].
    pub fn distance_mm(&mut self) -> Result<f32, Error<I2C::Error>> {
        let raw = self.raw_measurement()?;
        Ok(to_millimetres(raw))
    }
}

fn to_millimetres(raw: [u8; 3]) -> f32 {
    let micrometres = u32::from_be_bytes([0, raw[0], raw[1], raw[2]]);
    (micrometres as f32 / 1000.0).min(MAX_DISTANCE_MM)
}
