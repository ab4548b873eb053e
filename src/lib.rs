//! Blocking drivers for register-mapped I2C units.
//!
//! This crate drives small peripherals that expose a register file over a
//! shared I2C bus: DC motor controllers, rotary encoders, servo/IO
//! expanders, a colour sensor and an ultrasonic range finder. Every driver
//! is built from the same three layers:
//!
//! - **[`driver`]**: [`RegisterDriver`], the single I/O boundary. One bound
//!   [`Address`], one transfer per call, no retries.
//! - **[`codec`]**: register framing and typed value encode/decode with an
//!   explicit byte order at every call site.
//! - **[`probe`]**: identification-register checks and linear address
//!   scans. Every driver constructor runs the check, so a driver value only
//!   exists for a device that answered correctly.
//!
//! Motor-capable drivers share the vocabulary in [`motor`] and implement
//! [`MotorControl`].
//!
//! # Quick start
//!
//! ```ignore
//! use unit_drivers::dfr0592::{Config, Dfr0592};
//! use unit_drivers::{Direction, Motor, MotorControl};
//!
//! // `i2c` is any `embedded-hal` I2C bus, `delay` any `DelayNs`.
//! let mut hat = Dfr0592::new(i2c, delay, Config::default())?;
//! hat.set_pwm_frequency(1000)?;
//! hat.motor_movement(Motor::M1, Direction::Clockwise, 42.5)?;
//! hat.motor_stop(Motor::M1)?;
//! ```
//!
//! Sharing one bus between several drivers is done with the `embedded-hal-bus`
//! device wrappers (`RefCellDevice`, `MutexDevice`, ...), which serialise
//! each transaction.
//!
//! # Features
//!
//! - **`defmt`**: [`defmt::Format`] implementations on public types and
//!   transfer-level trace logging.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod codec;
pub mod driver;
pub mod error;
pub mod motor;
pub mod probe;

pub mod dfr0592;
pub mod ext_encoder;
pub mod hbridge;
pub mod servo_unit;
pub mod tcs3472;
pub mod ultrasonic;
pub mod ws15364;

pub use codec::{AdcResolution, Endian};
pub use driver::{Address, RegisterDriver};
pub use error::{Argument, Error, ErrorKind};
pub use motor::{Direction, DutyCycle, Motor, MotorControl, MotorState};
pub use probe::{Identity, IdRegister, Match};
