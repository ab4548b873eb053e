//! Error types shared by every driver.

use core::fmt;

use crate::driver::Address;

/// The caller-supplied value that failed validation.
///
/// Validation always happens before any bus traffic, so an
/// [`Error::InvalidArgument`] never leaves the hardware in a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Argument {
    /// Bus address outside `1..=127`.
    Address,
    /// Probe range outside `1..=127` or empty.
    Range,
    /// Motor, encoder or pin index not present on the device.
    Channel,
    /// Direction not valid for the command (e.g. `Stopped` for a movement).
    Direction,
    /// Duty cycle outside `0.0..=100.0` or not a number.
    DutyCycle,
    /// PWM frequency outside the device's supported range.
    Frequency,
    /// Encoder reduction ratio outside the device's supported range.
    ReductionRatio,
    /// Servo angle above 180°.
    Angle,
    /// Servo pulse width outside the supported range.
    Pulse,
    /// Register payload longer than a frame can carry.
    Payload,
    /// Integer width outside 1–4 bytes, or value wider than its field.
    Width,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Argument::Address => "bus address",
            Argument::Range => "address range",
            Argument::Channel => "channel",
            Argument::Direction => "direction",
            Argument::DutyCycle => "duty cycle",
            Argument::Frequency => "PWM frequency",
            Argument::ReductionRatio => "reduction ratio",
            Argument::Angle => "servo angle",
            Argument::Pulse => "servo pulse",
            Argument::Payload => "payload length",
            Argument::Width => "integer width",
        };
        f.write_str(name)
    }
}

/// Closed classification of [`Error`], for callers that branch on the kind
/// of failure rather than its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
    /// See [`Error::DeviceNotDetected`].
    DeviceNotDetected,
    /// See [`Error::Bus`].
    BusTransferFailed,
    /// See [`Error::PartialApplication`].
    PartialApplication,
}

/// Errors returned by the drivers in this crate.
///
/// `E` is the error type of the underlying `embedded-hal` bus. It is carried
/// untouched, so transport-level classification (no acknowledge,
/// arbitration loss, timeout) stays available through
/// [`embedded_hal::i2c::Error::kind`] or the transport's own type.
#[derive(Debug, PartialEq)]
pub enum Error<E> {
    /// A caller-supplied value was rejected before any bus transfer.
    InvalidArgument(Argument),

    /// Identification registers were unreadable or did not match.
    DeviceNotDetected { address: Address },

    /// A single transfer failed. Nothing from the failing operation was
    /// applied to the device.
    Bus {
        address: Address,
        register: Option<u8>,
        source: E,
    },

    /// A later step of a multi-step sequence failed after earlier writes had
    /// already landed. The device is in a state that matches neither the old
    /// nor the requested configuration; a corrective stop may be required.
    PartialApplication {
        address: Address,
        register: Option<u8>,
        source: E,
    },
}

impl<E> Error<E> {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::DeviceNotDetected { .. } => ErrorKind::DeviceNotDetected,
            Error::Bus { .. } => ErrorKind::BusTransferFailed,
            Error::PartialApplication { .. } => ErrorKind::PartialApplication,
        }
    }

    /// The transport error behind a [`Bus`](Error::Bus) or
    /// [`PartialApplication`](Error::PartialApplication) failure.
    pub fn bus_error(&self) -> Option<&E> {
        match self {
            Error::Bus { source, .. } | Error::PartialApplication { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Register targeted by the failing transfer, if any.
    pub fn register(&self) -> Option<u8> {
        match self {
            Error::Bus { register, .. } | Error::PartialApplication { register, .. } => *register,
            _ => None,
        }
    }

    /// Reclassify a bus failure that happened after earlier steps of the
    /// same operation succeeded.
    pub(crate) fn into_partial(self) -> Self {
        match self {
            Error::Bus {
                address,
                register,
                source,
            } => Error::PartialApplication {
                address,
                register,
                source,
            },
            other => other,
        }
    }
}

// Validation failures convert directly so `?` works on argument checks.
impl<E> From<Argument> for Error<E> {
    fn from(argument: Argument) -> Self {
        Error::InvalidArgument(argument)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(arg) => write!(f, "Invalid {}", arg),
            Error::DeviceNotDetected { address } => {
                write!(f, "No matching device at {:#04x}", address.get())
            }
            Error::Bus {
                address,
                register: Some(register),
                source,
            } => write!(
                f,
                "I2C error at {:#04x}, register {:#04x}: {:?}",
                address.get(),
                register,
                source
            ),
            Error::Bus {
                address, source, ..
            } => write!(f, "I2C error at {:#04x}: {:?}", address.get(), source),
            Error::PartialApplication {
                address,
                register: Some(register),
                source,
            } => write!(
                f,
                "Command partially applied at {:#04x}, register {:#04x}: {:?}",
                address.get(),
                register,
                source
            ),
            Error::PartialApplication {
                address, source, ..
            } => write!(
                f,
                "Command partially applied at {:#04x}: {:?}",
                address.get(),
                source
            ),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::InvalidArgument(arg) => defmt::write!(f, "Invalid argument: {}", arg),
            Error::DeviceNotDetected { address } => {
                defmt::write!(f, "No matching device at {}", address)
            }
            Error::Bus {
                address,
                register,
                source,
            } => defmt::write!(f, "I2C error at {} (register {}): {}", address, register, source),
            Error::PartialApplication {
                address,
                register,
                source,
            } => defmt::write!(
                f,
                "Partial application at {} (register {}): {}",
                address,
                register,
                source
            ),
        }
    }
}
