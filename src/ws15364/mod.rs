//! Driver for the Waveshare Motor Driver HAT (SKU 15364).
//!
//! The HAT pairs a PCA9685 PWM controller with a dual H-bridge. Each motor
//! uses one PCA9685 channel for speed and two as H-bridge direction inputs:
//!
//! | Motor | PWM | IN1 | IN2 |
//! |-------|-----|-----|-----|
//! | M1    | 0   | 1   | 2   |
//! | M2    | 5   | 3   | 4   |

pub mod pca9685;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::driver::Address;
use crate::error::{Argument, Error};
use crate::motor::{Direction, DutyCycle, Motor, MotorControl, MotorState};
use crate::probe::{self, AddressList};

use pca9685::{Pca9685, MAX_COUNT};

pub use pca9685::{IDENTITY, PWM_FREQUENCY_RANGE};

/// Factory default bus address.
pub const DEFAULT_ADDRESS: Address = Address::fixed(0x40);

/// PWM clock applied at construction unless configured otherwise.
pub const DEFAULT_PWM_FREQUENCY: u32 = 1500;

/// PCA9685 channels wired to one motor.
#[derive(Debug, Clone, Copy)]
struct Channels {
    pwm: u8,
    in1: u8,
    in2: u8,
}

const fn channels(motor: Motor) -> Channels {
    match motor {
        Motor::M1 => Channels {
            pwm: 0,
            in1: 1,
            in2: 2,
        },
        Motor::M2 => Channels {
            pwm: 5,
            in1: 3,
            in2: 4,
        },
    }
}

/// Construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub address: Address,
    /// Must lie in [`PWM_FREQUENCY_RANGE`].
    pub pwm_frequency: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            pwm_frequency: DEFAULT_PWM_FREQUENCY,
        }
    }
}

/// Handle to one Waveshare motor HAT.
///
/// Construction checks the PCA9685 power-on signature, initialises the
/// controller, programs the configured PWM clock and stops both motors.
/// Dropping the handle stops both motors again (best effort).
pub struct Ws15364<I2C: I2c, D: DelayNs> {
    pwm: Pca9685<I2C>,
    delay: D,
    states: [MotorState; 2],
}

impl<I2C, D> Ws15364<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Open the HAT at `config.address`.
    ///
    /// # Errors
    /// * [`Argument::Frequency`] if `config.pwm_frequency` is out of range
    ///   (checked before any transfer)
    /// * [`Error::DeviceNotDetected`] if the PCA9685 signature is missing
    pub fn new(i2c: I2C, mut delay: D, config: Config) -> Result<Self, Error<I2C::Error>> {
        if !PWM_FREQUENCY_RANGE.contains(&config.pwm_frequency) {
            return Err(Argument::Frequency.into());
        }

        let mut pwm = Pca9685::new(i2c, config.address);
        if !pwm.identify() {
            return Err(Error::DeviceNotDetected {
                address: config.address,
            });
        }
        pwm.init(&mut delay)?;

        let mut hat = Self {
            pwm,
            delay,
            states: [MotorState::Stopped; 2],
        };
        hat.set_pwm_frequency(config.pwm_frequency)?;
        hat.pwm.set_all_pwm(0, 0)?;
        for motor in Motor::ALL {
            hat.motor_stop(motor)?;
        }
        Ok(hat)
    }

    /// Scan the whole bus for PCA9685-based boards.
    pub fn detect(i2c: &mut I2C) -> AddressList {
        probe::scan_all(i2c, &IDENTITY)
    }

    /// The address this handle targets.
    pub fn address(&self) -> Address {
        self.pwm.address()
    }

    /// Stop both motors (best effort), then drop the handle.
    pub fn close(self) {}
}

impl<I2C, D> MotorControl for Ws15364<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = Error<I2C::Error>;

    /// Sets the H-bridge inputs for `direction`, then the PWM off-count
    /// `4095 * duty_cycle / 100`.
    fn motor_movement(
        &mut self,
        motor: Motor,
        direction: Direction,
        duty_cycle: f32,
    ) -> Result<(), Self::Error> {
        let direction = direction.require_rotation()?;
        let duty_cycle = DutyCycle::new(duty_cycle)?;

        let ch = channels(motor);
        let (low, high) = match direction {
            Direction::Clockwise => (ch.in1, ch.in2),
            _ => (ch.in2, ch.in1),
        };
        self.pwm.set_full_off(low)?;

        let off = (f32::from(MAX_COUNT) * duty_cycle.percent() / DutyCycle::MAX) as u16;
        let rest = self
            .pwm
            .set_full_on(high)
            .and_then(|()| self.pwm.set_pwm(ch.pwm, 0, off));
        if let Err(e) = rest {
            warn!("{} partially applied", motor);
            self.states[motor.index()] = MotorState::Indeterminate;
            return Err(e.into_partial());
        }

        self.states[motor.index()] = MotorState::Running {
            direction,
            duty_cycle,
        };
        Ok(())
    }

    /// Both H-bridge inputs full off.
    fn motor_stop(&mut self, motor: Motor) -> Result<(), Self::Error> {
        let ch = channels(motor);
        self.pwm.set_full_off(ch.in1)?;
        if let Err(e) = self.pwm.set_full_off(ch.in2) {
            self.states[motor.index()] = MotorState::Indeterminate;
            return Err(e.into_partial());
        }
        self.states[motor.index()] = MotorState::Stopped;
        Ok(())
    }

    /// Accepts `50..=1526` Hz; includes the PCA9685 oscillator settle.
    fn set_pwm_frequency(&mut self, hz: u32) -> Result<(), Self::Error> {
        self.pwm.set_pwm_frequency(hz, &mut self.delay)
    }

    fn motor_state(&self, motor: Motor) -> MotorState {
        self.states[motor.index()]
    }
}

impl<I2C, D> Drop for Ws15364<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn drop(&mut self) {
        debug!("WS15364 at {}: fail-safe stop", self.pwm.address());
        for motor in Motor::ALL {
            let _ = self.motor_stop(motor);
        }
    }
}
