//! Driver for the M5Stack H-Bridge unit.
//!
//! Single DC motor channel. Direction and speed live in separate registers;
//! the speed is written through the 16-bit register so a duty cycle keeps
//! most of its precision.

mod registers;

use embedded_hal::i2c::I2c;

use crate::codec::{AdcResolution, Endian};
use crate::driver::{Address, RegisterDriver};
use crate::error::{Argument, Error};
use crate::motor::{Direction, DutyCycle, Motor, MotorControl, MotorState};
use crate::probe::{self, AddressList};

pub use registers::{DEFAULT_ADDRESS, IDENTITY};

use registers::*;

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

/// Handle to one H-Bridge unit.
///
/// Only [`Motor::M1`] exists; any other channel is an
/// [`Argument::Channel`] error. Construction and drop both write the stop
/// code.
pub struct HBridge<I2C: I2c> {
    driver: RegisterDriver<I2C>,
    state: MotorState,
}

impl<I2C> HBridge<I2C>
where
    I2C: I2c,
{
    /// Open the unit at `config.address` and stop the motor.
    pub fn new(i2c: I2C, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut driver = RegisterDriver::new(i2c, config.address);
        driver.expect_identity(&IDENTITY)?;

        let mut unit = Self {
            driver,
            state: MotorState::Stopped,
        };
        unit.motor_stop(Motor::M1)?;
        Ok(unit)
    }

    /// Scan the whole bus for H-Bridge units.
    pub fn detect(i2c: &mut I2C) -> AddressList {
        probe::scan_all(i2c, &IDENTITY)
    }

    /// The address this handle targets.
    pub fn address(&self) -> Address {
        self.driver.address()
    }

    // -----------------------------------------------------------------------
    // Raw drive registers
    // -----------------------------------------------------------------------

    /// Read back the direction register. `None` for an undocumented code.
    pub fn driver_direction(&mut self) -> Result<Option<Direction>, Error<I2C::Error>> {
        let code = self.driver.read_u8(CONFIG)?;
        Ok(match code {
            DIRECTION_STOP => Some(Direction::Stopped),
            DIRECTION_FORWARD => Some(Direction::Clockwise),
            DIRECTION_BACKWARD => Some(Direction::CounterClockwise),
            _ => None,
        })
    }

    /// Raw 8-bit speed register.
    pub fn speed_8bit(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.driver.read_u8(SPEED_8BIT)
    }

    /// Write the 8-bit speed register directly, bypassing duty-cycle scaling.
    pub fn set_speed_8bit(&mut self, speed: u8) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(SPEED_8BIT, speed)
    }

    /// Raw 16-bit speed register.
    pub fn speed_16bit(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.driver.read_u16(SPEED_16BIT, Endian::Little)
    }

    /// Write the 16-bit speed register directly.
    pub fn set_speed_16bit(&mut self, speed: u16) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u16(SPEED_16BIT, speed, Endian::Little)
    }

    /// PWM frequency currently programmed, in Hz.
    pub fn pwm_frequency(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.driver.read_u16(PWM_FREQ, Endian::Little)
    }

    // -----------------------------------------------------------------------
    // Telemetry
    // -----------------------------------------------------------------------

    /// Motor supply ADC reading at the requested resolution.
    pub fn analog_input(&mut self, resolution: AdcResolution) -> Result<u16, Error<I2C::Error>> {
        match resolution {
            AdcResolution::Bits8 => self.driver.read_u8(ADC_8BIT).map(u16::from),
            AdcResolution::Bits12 => self.driver.read_u16(ADC_12BIT, Endian::Little),
        }
    }

    /// Motor current in amperes.
    pub fn motor_current(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.driver.read_f32_le(MOTOR_CURRENT)
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

    /// Reboot the unit into its firmware bootloader.
    ///
    /// The unit stops answering as a motor driver until it is re-flashed or
    /// power cycled.
    pub fn jump_bootloader(&mut self) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(JUMP_TO_BOOTLOADER, 1)
    }

    /// Stop the motor (best effort), then drop the handle.
    pub fn close(self) {}

    fn check_channel(motor: Motor) -> Result<(), Argument> {
        match motor {
            Motor::M1 => Ok(()),
            Motor::M2 => Err(Argument::Channel),
        }
    }
}

impl<I2C> MotorControl for HBridge<I2C>
where
    I2C: I2c,
{
    type Error = Error<I2C::Error>;

    /// Writes the direction code, then the 16-bit speed
    /// `round(duty_cycle / 100 * 65535)`.
    fn motor_movement(
        &mut self,
        motor: Motor,
        direction: Direction,
        duty_cycle: f32,
    ) -> Result<(), Self::Error> {
        Self::check_channel(motor)?;
        let direction = direction.require_rotation()?;
        let duty_cycle = DutyCycle::new(duty_cycle)?;

        let code = match direction {
            Direction::Clockwise => DIRECTION_FORWARD,
            _ => DIRECTION_BACKWARD,
        };
        self.driver.write_u8(CONFIG, code)?;

        let speed = duty_cycle.scale(u16::MAX);
        if let Err(e) = self.driver.write_u16(SPEED_16BIT, speed, Endian::Little) {
            warn!("H-Bridge speed write failed after direction change");
            self.state = MotorState::Indeterminate;
            return Err(e.into_partial());
        }

        self.state = MotorState::Running {
            direction,
            duty_cycle,
        };
        Ok(())
    }

    fn motor_stop(&mut self, motor: Motor) -> Result<(), Self::Error> {
        Self::check_channel(motor)?;
        self.driver.write_u8(CONFIG, DIRECTION_STOP)?;
        self.state = MotorState::Stopped;
        Ok(())
    }

    /// Any non-zero frequency up to 65535 Hz; the unit applies it without a
    /// settling delay.
    fn set_pwm_frequency(&mut self, hz: u32) -> Result<(), Self::Error> {
        let hz = u16::try_from(hz)
            .ok()
            .filter(|hz| *hz != 0)
            .ok_or(Argument::Frequency)?;
        self.driver.write_u16(PWM_FREQ, hz, Endian::Little)
    }

    /// [`Motor::M2`] always reports `Stopped`.
    fn motor_state(&self, motor: Motor) -> MotorState {
        match motor {
            Motor::M1 => self.state,
            Motor::M2 => MotorState::Stopped,
        }
    }
}

impl<I2C> Drop for HBridge<I2C>
where
    I2C: I2c,
{
    fn drop(&mut self) {
        debug!("H-Bridge at {}: fail-safe stop", self.driver.address());
        let _ = self.motor_stop(Motor::M1);
    }
}
