//! Driver for the DFRobot DFR0592 DC Motor Driver HAT.
//!
//! Two DC motor channels with optional encoder feedback. Speeds are written
//! as a whole-percent byte followed by a tenths byte, and stopping uses a
//! dedicated orientation code rather than a zero duty cycle.

mod registers;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::codec::{self, Endian};
use crate::driver::{Address, RegisterDriver};
use crate::error::{Argument, Error};
use crate::motor::{Direction, DutyCycle, Motor, MotorControl, MotorState};
use crate::probe::{self, AddressList};

pub use registers::{DEFAULT_ADDRESS, IDENTITY, PWM_FREQUENCY_RANGE, REDUCTION_RATIO_RANGE};

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

/// Handle to one DFR0592 board.
///
/// Construction verifies the product/version IDs, selects DC mode, stops
/// both motors and disables both encoders. Dropping the handle stops both
/// motors again (best effort).
///
/// # Example
///
/// ```ignore
/// use unit_drivers::dfr0592::{Config, Dfr0592};
/// use unit_drivers::{Direction, Motor, MotorControl};
///
/// let mut hat = Dfr0592::new(i2c, delay, Config::default())?;
/// hat.set_encoder_enable(Motor::M1)?;
/// hat.motor_movement(Motor::M1, Direction::CounterClockwise, 40.0)?;
/// let rpm = hat.encoder_speed(Motor::M1)?;
/// ```
pub struct Dfr0592<I2C: I2c, D: DelayNs> {
    driver: RegisterDriver<I2C>,
    delay: D,
    states: [MotorState; 2],
}

impl<I2C, D> Dfr0592<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Open the board at `config.address`.
    ///
    /// # Errors
    /// * [`Error::DeviceNotDetected`] if the ID registers are unreadable or
    ///   do not match
    /// * [`Error::Bus`] if any initialisation write fails
    pub fn new(i2c: I2C, delay: D, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut driver = RegisterDriver::new(i2c, config.address);
        driver.expect_identity(&IDENTITY)?;
        driver.write_u8(CTRL_MODE, CTRL_MODE_DC)?;

        let mut board = Self {
            driver,
            delay,
            states: [MotorState::Stopped; 2],
        };
        for motor in Motor::ALL {
            board.motor_stop(motor)?;
        }
        for motor in Motor::ALL {
            board.set_encoder_disable(motor)?;
        }
        Ok(board)
    }

    /// Scan the whole bus for DFR0592 boards.
    pub fn detect(i2c: &mut I2C) -> AddressList {
        probe::scan_all(i2c, &IDENTITY)
    }

    /// Current bus address.
    pub fn address(&self) -> Address {
        self.driver.address()
    }

    // -----------------------------------------------------------------------
    // Encoder operations
    // -----------------------------------------------------------------------

    /// Enable speed feedback for the encoder attached to `motor`.
    pub fn set_encoder_enable(&mut self, motor: Motor) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(encoder_block(motor), 0x01)
    }

    /// Disable speed feedback for the encoder attached to `motor`.
    pub fn set_encoder_disable(&mut self, motor: Motor) -> Result<(), Error<I2C::Error>> {
        self.driver.write_u8(encoder_block(motor), 0x00)
    }

    /// Set the gearbox reduction ratio used to convert encoder ticks to
    /// output shaft speed.
    ///
    /// # Errors
    /// * [`Argument::ReductionRatio`] unless `1 <= ratio <= 2000`
    pub fn set_encoder_reduction_ratio(
        &mut self,
        motor: Motor,
        ratio: u16,
    ) -> Result<(), Error<I2C::Error>> {
        if !REDUCTION_RATIO_RANGE.contains(&ratio) {
            return Err(Argument::ReductionRatio.into());
        }
        let register = encoder_block(motor) + ENCODER_REDUCTION_RATIO_OFFSET;
        self.driver.write_u16(register, ratio, Endian::Big)
    }

    /// Signed output shaft speed in RPM. Negative values mean
    /// counter-clockwise rotation.
    pub fn encoder_speed(&mut self, motor: Motor) -> Result<i16, Error<I2C::Error>> {
        let register = encoder_block(motor) + ENCODER_SPEED_OFFSET;
        self.driver.read_i16(register, Endian::Big)
    }

    // -----------------------------------------------------------------------
    // Readback and addressing
    // -----------------------------------------------------------------------

    /// Read back the orientation register of `motor`.
    ///
    /// Returns `None` for a code the board is not documented to hold.
    pub fn motor_direction(&mut self, motor: Motor) -> Result<Option<Direction>, Error<I2C::Error>> {
        let code = self.driver.read_u8(motor_block(motor))?;
        Ok(match code {
            ORIENTATION_CW => Some(Direction::Clockwise),
            ORIENTATION_CCW => Some(Direction::CounterClockwise),
            ORIENTATION_STOP => Some(Direction::Stopped),
            _ => None,
        })
    }

    /// Program a new bus address and retarget this handle to it.
    ///
    /// The handle keeps its old address if the write fails.
    pub fn set_address(&mut self, address: Address) -> Result<(), Error<I2C::Error>> {
        self.driver.set_address(SLAVE_ADDR, address)
    }

    /// Stop both motors, then drop the handle.
    ///
    /// Equivalent to dropping; stop failures are discarded. Call
    /// [`motor_stop`](MotorControl::motor_stop) first to observe them.
    pub fn close(self) {}
}

impl<I2C, D> MotorControl for Dfr0592<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = Error<I2C::Error>;

    fn motor_movement(
        &mut self,
        motor: Motor,
        direction: Direction,
        duty_cycle: f32,
    ) -> Result<(), Self::Error> {
        let direction = direction.require_rotation()?;
        let duty_cycle = DutyCycle::new(duty_cycle)?;

        let register = motor_block(motor);
        let code = match direction {
            Direction::Clockwise => ORIENTATION_CW,
            _ => ORIENTATION_CCW,
        };
        self.driver.write_u8(register, code)?;

        let speed = codec::encode_duty_cycle(duty_cycle);
        if let Err(e) = self.driver.write_bytes(register + 1, &speed) {
            warn!("{} speed write failed after direction change", motor);
            self.states[motor.index()] = MotorState::Indeterminate;
            return Err(e.into_partial());
        }

        self.states[motor.index()] = MotorState::Running {
            direction,
            duty_cycle,
        };
        Ok(())
    }

    fn motor_stop(&mut self, motor: Motor) -> Result<(), Self::Error> {
        self.driver.write_u8(motor_block(motor), ORIENTATION_STOP)?;
        self.states[motor.index()] = MotorState::Stopped;
        Ok(())
    }

    /// Accepts `100..=12750` Hz; the board stores the value in 50 Hz steps
    /// (rounding down) and needs 100 ms to settle afterwards.
    fn set_pwm_frequency(&mut self, hz: u32) -> Result<(), Self::Error> {
        if !PWM_FREQUENCY_RANGE.contains(&hz) {
            return Err(Argument::Frequency.into());
        }
        self.driver
            .write_u8(MOTOR_PWM, (hz / PWM_FREQUENCY_STEP) as u8)?;
        self.delay.delay_ms(PWM_SETTLE_MS);
        Ok(())
    }

    fn motor_state(&self, motor: Motor) -> MotorState {
        self.states[motor.index()]
    }
}

impl<I2C, D> Drop for Dfr0592<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn drop(&mut self) {
        debug!("DFR0592 at {}: fail-safe stop", self.driver.address());
        for motor in Motor::ALL {
            let _ = self.motor_stop(motor);
        }
    }
}

fn motor_block(motor: Motor) -> u8 {
    MOTOR1_ORIENTATION + MOTOR_STRIDE * motor.index() as u8
}

fn encoder_block(motor: Motor) -> u8 {
    ENCODER1_EN + ENCODER_STRIDE * motor.index() as u8
}
