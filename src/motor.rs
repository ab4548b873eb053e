//! Motor-control vocabulary shared by the motor drivers.

use crate::error::Argument;

/// Motor channel on a controller board.
///
/// Single-channel controllers accept only [`Motor::M1`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Motor {
    M1,
    M2,
}

impl Motor {
    /// Both channels of a dual controller, in register order.
    pub const ALL: [Motor; 2] = [Motor::M1, Motor::M2];

    /// Zero-based channel index, used as the register block multiplier.
    pub const fn index(self) -> usize {
        match self {
            Motor::M1 => 0,
            Motor::M2 => 1,
        }
    }
}

/// Rotation direction of a motor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
    /// Outputs de-energised. Reported by readback; never accepted by
    /// [`MotorControl::motor_movement`].
    Stopped,
}

impl Direction {
    /// Reject anything that is not a rotation.
    pub(crate) fn require_rotation(self) -> Result<Self, Argument> {
        match self {
            Direction::Clockwise | Direction::CounterClockwise => Ok(self),
            Direction::Stopped => Err(Argument::Direction),
        }
    }
}

/// PWM duty cycle in percent, validated to `0.0..=100.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCycle(f32);

impl DutyCycle {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 100.0;

    /// Fails with [`Argument::DutyCycle`] outside `0.0..=100.0` (NaN included).
    pub fn new(percent: f32) -> Result<Self, Argument> {
        if (Self::MIN..=Self::MAX).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(Argument::DutyCycle)
        }
    }

    pub fn percent(self) -> f32 {
        self.0
    }

    /// Scale onto an integer register range `0..=full_scale`, rounding to
    /// the nearest step.
    pub fn scale(self, full_scale: u16) -> u16 {
        let scaled = self.0 / Self::MAX * f32::from(full_scale) + 0.5;
        scaled as u16
    }
}

impl TryFrom<f32> for DutyCycle {
    type Error = Argument;

    fn try_from(percent: f32) -> Result<Self, Self::Error> {
        DutyCycle::new(percent)
    }
}

/// Last state commanded on a channel by this driver.
///
/// The device stays the source of truth; this records what the driver
/// asked for so that a half-applied command is visible to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    Stopped,
    Running {
        direction: Direction,
        duty_cycle: DutyCycle,
    },
    /// A multi-step command failed part way. Hardware may hold the new
    /// direction with the old speed (or similar); issue a stop.
    Indeterminate,
}

/// Command protocol common to every motor controller driver.
///
/// All methods validate their arguments before touching the bus, so an
/// `InvalidArgument` error means no transfer was issued.
pub trait MotorControl {
    type Error;

    /// Drive `motor` in `direction` at `duty_cycle` percent.
    ///
    /// `direction` must be a rotation and `duty_cycle` within
    /// `0.0..=100.0`. The direction is written first, then the speed; if the
    /// speed write fails the error is a partial application and the channel
    /// state becomes [`MotorState::Indeterminate`].
    fn motor_movement(
        &mut self,
        motor: Motor,
        direction: Direction,
        duty_cycle: f32,
    ) -> Result<(), Self::Error>;

    /// Write the dedicated stop code for `motor`. Safe from any state and
    /// idempotent.
    fn motor_stop(&mut self, motor: Motor) -> Result<(), Self::Error>;

    /// Program the PWM clock shared by all channels, including any settling
    /// delay the device needs before the next command.
    fn set_pwm_frequency(&mut self, hz: u32) -> Result<(), Self::Error>;

    /// Last commanded state of `motor`.
    fn motor_state(&self, motor: Motor) -> MotorState;
}
