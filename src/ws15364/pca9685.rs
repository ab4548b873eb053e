//! Register-level access to the PCA9685 16-channel PWM controller that
//! drives the Waveshare motor HAT.
//!
//! Each output channel has a 4-byte block `ON_L, ON_H, OFF_L, OFF_H` of
//! 12-bit counter values; bit 4 of `ON_H`/`OFF_H` forces the output fully
//! on/off. Auto-increment is enabled at init so one write updates a whole
//! block.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::codec::{self, Endian};
use crate::driver::{Address, RegisterDriver};
use crate::error::{Argument, Error};
use crate::probe::{IdRegister, Identity, Match};

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const SUBADR1: u8 = 0x02;
pub const ALLCALLADR: u8 = 0x05;

/// `LED0_ON_L`; channel `n` starts at `LED0_ON_L + 4 * n`.
pub const LED0_ON_L: u8 = 0x06;

pub const ALL_LED_ON_L: u8 = 0xFA;
pub const PRE_SCALE: u8 = 0xFE;

// ---------------------------------------------------------------------------
// Bits and constants
// ---------------------------------------------------------------------------

pub const MODE1_RESTART: u8 = 0x80;
pub const MODE1_AI: u8 = 0x20;
pub const MODE1_SLEEP: u8 = 0x10;
pub const MODE1_ALLCALL: u8 = 0x01;

/// Totem-pole outputs.
pub const MODE2_OUTDRV: u8 = 0x04;

/// Full-on / full-off flag in `ON_H` / `OFF_H`.
pub const FULL: u8 = 0x10;

/// Internal oscillator frequency.
pub const OSCILLATOR_HZ: u32 = 25_000_000;

/// Counter resolution per PWM period.
pub const STEPS: u32 = 4096;

/// Output channels `0..16`.
pub const CHANNEL_COUNT: u8 = 16;

/// PWM clock range the prescaler can reach from the internal oscillator.
pub const PWM_FREQUENCY_RANGE: core::ops::RangeInclusive<u32> = 50..=1526;

/// Largest counter value.
pub const MAX_COUNT: u16 = 4095;

/// Oscillator start-up time after leaving sleep.
pub const OSCILLATOR_SETTLE_MS: u32 = 5;

/// Power-on values of the sub-address and all-call registers.
pub const IDENTITY: Identity = Identity {
    name: "PCA9685",
    registers: &[
        IdRegister {
            register: SUBADR1,
            expected: Match::Exact(0xE2),
        },
        IdRegister {
            register: ALLCALLADR,
            expected: Match::Exact(0xE0),
        },
    ],
};

/// Prescale value for `hz`: `round(25 MHz / (4096 * hz)) - 1`, clamped to
/// the register's `0..=255`.
pub fn prescale(hz: u32) -> u8 {
    let period = STEPS.saturating_mul(hz).max(1);
    let rounded = (OSCILLATOR_HZ + period / 2) / period;
    rounded.saturating_sub(1).min(u32::from(u8::MAX)) as u8
}

/// Register-level PCA9685 access.
pub struct Pca9685<I2C> {
    driver: RegisterDriver<I2C>,
}

impl<I2C> Pca9685<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self {
            driver: RegisterDriver::new(i2c, address),
        }
    }

    pub fn address(&self) -> Address {
        self.driver.address()
    }

    pub fn identify(&mut self) -> bool {
        self.driver.identify(&IDENTITY)
    }

    /// Force every output off, select totem-pole outputs, enable
    /// auto-increment and wake the oscillator.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I2C::Error>> {
        self.set_all_pwm(0, 0)?;
        self.driver.write_u8(MODE2, MODE2_OUTDRV)?;
        self.driver.write_u8(MODE1, MODE1_ALLCALL | MODE1_AI)?;
        delay.delay_ms(OSCILLATOR_SETTLE_MS);

        let mode = self.driver.read_u8(MODE1)? & !MODE1_SLEEP;
        self.driver.write_u8(MODE1, mode)?;
        delay.delay_ms(OSCILLATOR_SETTLE_MS);
        Ok(())
    }

    /// Program the PWM period.
    ///
    /// The prescaler can only be written while the oscillator sleeps, so
    /// this is a sleep / prescale / wake / restart sequence with an
    /// oscillator settle before the restart. A failure after the sleep
    /// write is a [`Error::PartialApplication`]: the controller may be left
    /// asleep with outputs off.
    ///
    /// # Errors
    /// * [`Argument::Frequency`] outside [`PWM_FREQUENCY_RANGE`], before any
    ///   transfer
    pub fn set_pwm_frequency<D: DelayNs>(
        &mut self,
        hz: u32,
        delay: &mut D,
    ) -> Result<(), Error<I2C::Error>> {
        if !PWM_FREQUENCY_RANGE.contains(&hz) {
            return Err(Argument::Frequency.into());
        }
        let prescale = prescale(hz);
        let old = self.driver.read_u8(MODE1)?;
        let awake = old & !(MODE1_SLEEP | MODE1_RESTART);

        self.driver.write_u8(MODE1, awake | MODE1_SLEEP)?;
        self.write_prescale_and_wake(prescale, awake, delay)
            .map_err(Error::into_partial)
    }

    fn write_prescale_and_wake<D: DelayNs>(
        &mut self,
        prescale: u8,
        awake: u8,
        delay: &mut D,
    ) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(PRE_SCALE, prescale)?;
        self.driver.write_u8(MODE1, awake)?;
        delay.delay_ms(OSCILLATOR_SETTLE_MS);
        self.driver.write_u8(MODE1, awake | MODE1_RESTART)
    }

    /// Set the on/off counter values of `channel`.
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Error<I2C::Error>> {
        let register = channel_block(channel)?;
        self.write_block(register, on, off)
    }

    /// Set the on/off counter values of every channel at once.
    pub fn set_all_pwm(&mut self, on: u16, off: u16) -> Result<(), Error<I2C::Error>> {
        self.write_block(ALL_LED_ON_L, on, off)
    }

    /// Drive `channel` permanently high.
    pub fn set_full_on(&mut self, channel: u8) -> Result<(), Error<I2C::Error>> {
        let register = channel_block(channel)?;
        self.driver
            .write_bytes(register, &[0x00, FULL, 0x00, 0x00])
    }

    /// Drive `channel` permanently low.
    pub fn set_full_off(&mut self, channel: u8) -> Result<(), Error<I2C::Error>> {
        let register = channel_block(channel)?;
        self.driver
            .write_bytes(register, &[0x00, 0x00, 0x00, FULL])
    }

    fn write_block(&mut self, register: u8, on: u16, off: u16) -> Result<(), Error<I2C::Error>> {
        let mut block = [0u8; 4];
        codec::encode_unsigned(u32::from(on), &mut block[..2], Endian::Little)?;
        codec::encode_unsigned(u32::from(off), &mut block[2..], Endian::Little)?;
        self.driver.write_bytes(register, &block)
    }
}

/// First register of `channel`'s block. Channels past 15 would alias the
/// all-call and prescale registers.
fn channel_block(channel: u8) -> Result<u8, Argument> {
    if channel < CHANNEL_COUNT {
        Ok(LED0_ON_L + 4 * channel)
    } else {
        Err(Argument::Channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescale_values() {
        assert_eq!(prescale(1500), 3);
        assert_eq!(prescale(1526), 3);
        assert_eq!(prescale(1000), 5);
        assert_eq!(prescale(50), 121);
    }

    #[test]
    fn prescale_clamps_extremes() {
        assert_eq!(prescale(0), u8::MAX);
        assert_eq!(prescale(1), u8::MAX);
        assert_eq!(prescale(u32::MAX), 0);
    }

    #[test]
    fn channel_blocks() {
        assert_eq!(channel_block(0), Ok(0x06));
        assert_eq!(channel_block(5), Ok(0x1A));
        assert_eq!(channel_block(15), Ok(0x42));
        assert_eq!(channel_block(16), Err(Argument::Channel));
        assert_eq!(channel_block(62), Err(Argument::Channel));
        assert_eq!(channel_block(u8::MAX), Err(Argument::Channel));
    }
}
