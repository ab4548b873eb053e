//! Device presence probing.
//!
//! A device is identified by reading a short list of registers and comparing
//! each value with what that device family is known to return. Probing is
//! strictly sequential and keeps no state between calls, since units can be
//! hot-plugged.

use core::ops::RangeInclusive;

use embedded_hal::i2c::I2c;
use heapless::Vec;

use crate::driver::Address;
use crate::error::{Argument, Error};

/// Expected contents of one identification register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Exactly this value (product or version ID).
    Exact(u8),
    /// Any of these values (one ID per silicon variant).
    OneOf(&'static [u8]),
    /// The register echoes the address being probed.
    BusAddress,
    /// The register only has to be readable.
    Any,
}

impl Match {
    fn accepts(&self, value: u8, address: Address) -> bool {
        match self {
            Match::Exact(expected) => value == *expected,
            Match::OneOf(expected) => expected.contains(&value),
            Match::BusAddress => value == address.get(),
            Match::Any => true,
        }
    }
}

/// One identification register and its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRegister {
    pub register: u8,
    pub expected: Match,
}

/// Identification signature of a device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Human-readable family name, for logs.
    pub name: &'static str,
    /// Registers read in order. Empty means the device only has to
    /// acknowledge a one-byte read.
    pub registers: &'static [IdRegister],
}

/// Result of a scan. Capacity covers the whole 7-bit range.
pub type AddressList = Vec<Address, { Address::MAX as usize }>;

/// The full assignable range, `1..=127`.
pub const FULL_RANGE: RangeInclusive<u8> = Address::MIN..=Address::MAX;

/// `true` if `address` answers with every register of `identity`.
///
/// Any failed read counts as absent; the error itself is dropped.
pub fn check<I2C: I2c>(i2c: &mut I2C, address: Address, identity: &Identity) -> bool {
    let mut value = [0u8; 1];

    if identity.registers.is_empty() {
        return i2c.read(address.get(), &mut value).is_ok();
    }

    identity.registers.iter().all(|id| {
        i2c.write_read(address.get(), &[id.register], &mut value)
            .is_ok()
            && id.expected.accepts(value[0], address)
    })
}

/// Check every address in `range` for `identity`, in ascending order.
///
/// A failure at one address never aborts the scan. The range is validated
/// before any transfer; it must be non-empty and within `1..=127`.
pub fn scan<I2C: I2c>(
    i2c: &mut I2C,
    range: RangeInclusive<u8>,
    identity: &Identity,
) -> Result<AddressList, Error<I2C::Error>> {
    if range.is_empty() || *range.start() < Address::MIN || *range.end() > Address::MAX {
        return Err(Argument::Range.into());
    }

    Ok(scan_range(i2c, range, identity))
}

/// [`scan`] over the full 7-bit range.
pub fn scan_all<I2C: I2c>(i2c: &mut I2C, identity: &Identity) -> AddressList {
    scan_range(i2c, FULL_RANGE, identity)
}

fn scan_range<I2C: I2c>(
    i2c: &mut I2C,
    range: RangeInclusive<u8>,
    identity: &Identity,
) -> AddressList {
    let mut found = AddressList::new();
    for address in range.filter_map(Address::new) {
        if check(i2c, address, identity) {
            trace!("{} answered at {}", identity.name, address);
            // Cannot overflow: at most 127 candidates.
            let _ = found.push(address);
        }
    }
    found
}
