//! Driver for the TCS3472 colour light-to-digital converter.
//!
//! Every register selector carries the command bit [`COMMAND_BIT`]. The
//! four 16-bit channel counters are little-endian.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::codec::Endian;
use crate::driver::{Address, RegisterDriver};
use crate::error::Error;
use crate::probe::{self, AddressList, IdRegister, Identity, Match};

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

pub const COMMAND_BIT: u8 = 0x80;

pub const ENABLE: u8 = 0x00;
pub const ATIME: u8 = 0x01;
/// Analog gain.
pub const CONTROL: u8 = 0x0F;
pub const ID: u8 = 0x12;
pub const STATUS: u8 = 0x13;
pub const CDATA: u8 = 0x14;
pub const RDATA: u8 = 0x16;
pub const GDATA: u8 = 0x18;
pub const BDATA: u8 = 0x1A;

pub const ENABLE_PON: u8 = 0x01;
pub const ENABLE_AEN: u8 = 0x02;

/// `AVALID` bit of [`STATUS`]: an integration cycle has completed.
pub const STATUS_AVALID: u8 = 0x01;

/// Oscillator warm-up between `PON` and `AEN`.
pub const POWER_ON_SETTLE_MS: u32 = 3;

/// Factory address.
pub const DEFAULT_ADDRESS: Address = Address::fixed(0x29);

/// `TCS34721/5` report `0x44`, `TCS34723/7` report `0x4D`.
pub const IDENTITY: Identity = Identity {
    name: "TCS3472",
    registers: &[IdRegister {
        register: COMMAND_BIT | ID,
        expected: Match::OneOf(&[0x44, 0x4D]),
    }],
};

/// ATIME register value. One integration cycle is 2.4 ms; the sensor
/// integrates for `256 - value` cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntegrationTime(pub u8);

impl IntegrationTime {
    pub const MS_2_4: Self = Self(0xFF);
    pub const MS_24: Self = Self(0xF6);
    pub const MS_50: Self = Self(0xEB);
    pub const MS_60: Self = Self(0xE7);
    pub const MS_101: Self = Self(0xD6);
    pub const MS_120: Self = Self(0xCE);
    pub const MS_154: Self = Self(0xC0);
    pub const MS_180: Self = Self(0xB5);
    pub const MS_199: Self = Self(0xAD);
    pub const MS_240: Self = Self(0x9C);
    pub const MS_300: Self = Self(0x83);
    pub const MS_360: Self = Self(0x6A);
    pub const MS_401: Self = Self(0x59);
    pub const MS_420: Self = Self(0x51);
    pub const MS_480: Self = Self(0x38);
    pub const MS_499: Self = Self(0x30);
    pub const MS_540: Self = Self(0x1F);
    pub const MS_600: Self = Self(0x06);
    pub const MS_614: Self = Self(0x00);

    /// One integration period in whole milliseconds, rounded up.
    pub fn period_ms(self) -> u32 {
        (256 - u32::from(self.0)) * 12 / 5 + 1
    }
}

impl Default for IntegrationTime {
    fn default() -> Self {
        Self::MS_154
    }
}

/// Analog gain applied to all four channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    #[default]
    X1 = 0x00,
    X4 = 0x01,
    X16 = 0x02,
    X60 = 0x03,
}

/// Raw channel counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub clear: u16,
}

impl Color {
    /// Channels normalised by the clear count onto `0..=255`. Black when
    /// the clear count is zero.
    pub fn to_rgb(self) -> Color {
        if self.clear == 0 {
            return Color::default();
        }
        let clear = f32::from(self.clear);
        let scale = |channel: u16| (f32::from(channel) / clear * 255.0) as u16;
        Color {
            red: scale(self.red),
            green: scale(self.green),
            blue: scale(self.blue),
            clear: self.clear,
        }
    }
}

/// Construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub address: Address,
    pub gain: Gain,
    pub integration_time: IntegrationTime,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            gain: Gain::default(),
            integration_time: IntegrationTime::default(),
        }
    }
}

/// Handle to one TCS3472.
///
/// The sensor starts powered down; call [`power_on`](Self::power_on) before
/// reading. Dropping the handle powers it down again (best effort).
pub struct Tcs3472<I2C: I2c, D: DelayNs> {
    driver: RegisterDriver<I2C>,
    delay: D,
    gain: Gain,
    integration_time: IntegrationTime,
}

impl<I2C, D> Tcs3472<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Open the sensor and program the configured integration time and gain.
    pub fn new(i2c: I2C, delay: D, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut driver = RegisterDriver::new(i2c, config.address);
        driver.expect_identity(&IDENTITY)?;

        let mut sensor = Self {
            driver,
            delay,
            gain: config.gain,
            integration_time: config.integration_time,
        };
        sensor.set_integration_time(config.integration_time)?;
        sensor.set_gain(config.gain)?;
        Ok(sensor)
    }

    /// Scan the whole bus for TCS3472 sensors.
    pub fn detect(i2c: &mut I2C) -> AddressList {
        probe::scan_all(i2c, &IDENTITY)
    }

    pub fn address(&self) -> Address {
        self.driver.address()
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn integration_time(&self) -> IntegrationTime {
        self.integration_time
    }

    pub fn set_integration_time(&mut self, time: IntegrationTime) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(COMMAND_BIT | ATIME, time.0)?;
        self.integration_time = time;
        Ok(())
    }

    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(COMMAND_BIT | CONTROL, gain as u8)?;
        self.gain = gain;
        Ok(())
    }

    /// Device ID register.
    pub fn id(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.driver.read_u8(COMMAND_BIT | ID)
    }

    pub fn status(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.driver.read_u8(COMMAND_BIT | STATUS)
    }

    /// Power up the oscillator, enable the ADC and wait for the first
    /// integration to complete.
    ///
    /// A failed ADC enable is a [`Error::PartialApplication`]: the oscillator
    /// is left running.
    pub fn power_on(&mut self) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(COMMAND_BIT | ENABLE, ENABLE_PON)?;
        self.delay.delay_ms(POWER_ON_SETTLE_MS);
        self.driver
            .write_u8(COMMAND_BIT | ENABLE, ENABLE_PON | ENABLE_AEN)
            .map_err(Error::into_partial)?;
        self.delay.delay_ms(self.integration_time.period_ms());
        Ok(())
    }

    pub fn power_off(&mut self) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(COMMAND_BIT | ENABLE, 0x00)
    }

    /// Read all four channels, then wait one integration period so the next
    /// call sees a fresh sample.
    pub fn color(&mut self) -> Result<Color, Error<I2C::Error>> {
        let clear = self.driver.read_u16(COMMAND_BIT | CDATA, Endian::Little)?;
        let red = self.driver.read_u16(COMMAND_BIT | RDATA, Endian::Little)?;
        let green = self.driver.read_u16(COMMAND_BIT | GDATA, Endian::Little)?;
        let blue = self.driver.read_u16(COMMAND_BIT | BDATA, Endian::Little)?;
        self.delay.delay_ms(self.integration_time.period_ms());
        Ok(Color {
            red,
            green,
            blue,
            clear,
        })
    }

    /// [`color`](Self::color) normalised with [`Color::to_rgb`].
    pub fn rgb(&mut self) -> Result<Color, Error<I2C::Error>> {
        self.color().map(Color::to_rgb)
    }

    /// Power the sensor down, then drop the handle.
    pub fn close(self) {}
}

impl<I2C, D> Drop for Tcs3472<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn drop(&mut self) {
        let _ = self.power_off();
    }
}
