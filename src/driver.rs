//! Low-level register protocol driver.
//!
//! [`RegisterDriver`] owns the bus handle and the bound 7-bit address, and is
//! the only place in the crate that talks to the bus. Every public device
//! operation is built from its transfer primitive and typed helpers.

use embedded_hal::i2c::I2c;

use crate::codec::{self, Endian};
use crate::error::{Argument, Error};
use crate::probe::{self, Identity};

/// A 7-bit I2C bus address in `1..=127`.
///
/// Address `0` is the general-call address and is never bound to a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    /// Lowest assignable address.
    pub const MIN: u8 = 1;
    /// Highest 7-bit address.
    pub const MAX: u8 = 127;

    /// Returns `None` if `raw` is outside `1..=127`.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= Self::MIN && raw <= Self::MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// For the per-device default address constants; fails at compile time
    /// when `raw` is out of range.
    pub(crate) const fn fixed(raw: u8) -> Self {
        assert!(raw >= Self::MIN && raw <= Self::MAX, "7-bit address out of range");
        Self(raw)
    }

    /// The raw 7-bit value.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Address {
    type Error = Argument;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Address::new(raw).ok_or(Argument::Address)
    }
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address.0
    }
}

/// Register protocol driver bound to one device.
///
/// Owns an I2C bus handle (or a shared-bus device wrapper) and issues
/// exactly one transfer attempt per call. Errors carry the bound address,
/// the register selector and the untouched transport error.
pub struct RegisterDriver<I2C> {
    i2c: I2C,
    address: Address,
}

impl<I2C> RegisterDriver<I2C>
where
    I2C: I2c,
{
    /// Bind `i2c` to `address`. Generates no bus traffic.
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self { i2c, address }
    }

    /// The address all transfers currently target.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Give back the bus handle.
    pub fn release(self) -> I2C {
        self.i2c
    }

    // -----------------------------------------------------------------------
    // Core protocol primitive
    // -----------------------------------------------------------------------

    /// Issue one transfer to the bound address.
    ///
    /// - empty `read`: write-only transaction
    /// - empty `write`: read-only transaction
    /// - both: a single write-then-read transaction with repeated start, so
    ///   no other transaction on the bus can interleave with it
    pub fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        let address = self.address;
        trace!(
            "i2c {} write {} read {} bytes",
            address,
            write,
            read.len()
        );

        let result = match (write.is_empty(), read.is_empty()) {
            (_, true) => self.i2c.write(address.get(), write),
            (true, false) => self.i2c.read(address.get(), read),
            (false, false) => self.i2c.write_read(address.get(), write, read),
        };

        result.map_err(|source| Error::Bus {
            address,
            register: write.first().copied(),
            source,
        })
    }

    /// Select `register` and fill `buf` from it.
    pub fn read_bytes(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        self.transfer(&[register], buf)
    }

    /// Write `payload` starting at `register` in one transaction.
    pub fn write_bytes(&mut self, register: u8, payload: &[u8]) -> Result<(), Error<I2C::Error>> {
        let frame = codec::encode_write(register, payload)?;
        self.transfer(&frame, &mut [])
    }

    // -----------------------------------------------------------------------
    // Typed read/write helpers
    // -----------------------------------------------------------------------

    /// Read one byte from `register`.
    pub fn read_u8(&mut self, register: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.read_bytes(register, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a 16-bit register in `endian` byte order.
    pub fn read_u16(&mut self, register: u8, endian: Endian) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.read_bytes(register, &mut buf)?;
        Ok(codec::decode_unsigned(&buf, endian)? as u16)
    }

    /// Read a 32-bit register in `endian` byte order.
    pub fn read_u32(&mut self, register: u8, endian: Endian) -> Result<u32, Error<I2C::Error>> {
        let mut buf = [0u8; 4];
        self.read_bytes(register, &mut buf)?;
        Ok(codec::decode_unsigned(&buf, endian)?)
    }

    /// Read a 16-bit two's-complement register.
    pub fn read_i16(&mut self, register: u8, endian: Endian) -> Result<i16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.read_bytes(register, &mut buf)?;
        Ok(codec::decode_signed16(buf, endian))
    }

    /// Read a 32-bit two's-complement register.
    pub fn read_i32(&mut self, register: u8, endian: Endian) -> Result<i32, Error<I2C::Error>> {
        let mut buf = [0u8; 4];
        self.read_bytes(register, &mut buf)?;
        Ok(codec::decode_signed(&buf, endian)?)
    }

    /// Read an IEEE-754 single stored little-endian (current/voltage
    /// telemetry registers).
    pub fn read_f32_le(&mut self, register: u8) -> Result<f32, Error<I2C::Error>> {
        let mut buf = [0u8; 4];
        self.read_bytes(register, &mut buf)?;
        Ok(codec::decode_f32_le(buf))
    }

    /// Write one byte to `register`.
    pub fn write_u8(&mut self, register: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.transfer(&[register, value], &mut [])
    }

    /// Write a 16-bit value in `endian` byte order.
    pub fn write_u16(
        &mut self,
        register: u8,
        value: u16,
        endian: Endian,
    ) -> Result<(), Error<I2C::Error>> {
        let mut bytes = [0u8; 2];
        codec::encode_unsigned(u32::from(value), &mut bytes, endian)?;
        self.write_bytes(register, &bytes)
    }

    /// Write a 32-bit value in `endian` byte order.
    pub fn write_u32(
        &mut self,
        register: u8,
        value: u32,
        endian: Endian,
    ) -> Result<(), Error<I2C::Error>> {
        let mut bytes = [0u8; 4];
        codec::encode_unsigned(value, &mut bytes, endian)?;
        self.write_bytes(register, &bytes)
    }

    // -----------------------------------------------------------------------
    // Identification and addressing
    // -----------------------------------------------------------------------

    /// `true` if the bound address answers with `identity`.
    pub fn identify(&mut self, identity: &Identity) -> bool {
        probe::check(&mut self.i2c, self.address, identity)
    }

    /// Fail with [`Error::DeviceNotDetected`] unless the bound address
    /// answers with `identity`.
    pub fn expect_identity(&mut self, identity: &Identity) -> Result<(), Error<I2C::Error>> {
        if self.identify(identity) {
            debug!("{} detected at {}", identity.name, self.address);
            Ok(())
        } else {
            Err(Error::DeviceNotDetected {
                address: self.address,
            })
        }
    }

    /// Program a new address through the device's address register, then
    /// retarget this driver.
    ///
    /// The binding only changes after the write is acknowledged; on failure
    /// the driver keeps using the old address.
    pub fn set_address(&mut self, register: u8, new: Address) -> Result<(), Error<I2C::Error>> {
        self.write_u8(register, new.get())?;
        debug!("rebinding {} -> {}", self.address, new);
        self.address = new;
        Ok(())
    }
}
