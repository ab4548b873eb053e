//! Register map of the M5Stack H-Bridge unit.
//!
//! Multi-byte registers are little-endian.

use crate::driver::Address;
use crate::probe::{IdRegister, Identity, Match};

// ---------------------------------------------------------------------------
// Drive configuration block
// ---------------------------------------------------------------------------

/// Direction code (see `DIRECTION_*`).
pub const CONFIG: u8 = 0x00;

/// 8-bit speed, `0..=255`.
pub const SPEED_8BIT: u8 = 0x01;

/// 16-bit speed, `0..=65535`.
pub const SPEED_16BIT: u8 = 0x02;

/// PWM frequency in Hz (u16).
pub const PWM_FREQ: u8 = 0x04;

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Motor supply ADC, 8-bit.
pub const ADC_8BIT: u8 = 0x10;

/// Motor supply ADC, 12-bit (u16).
pub const ADC_12BIT: u8 = 0x20;

/// Motor current in amperes (f32).
pub const MOTOR_CURRENT: u8 = 0x30;

// ---------------------------------------------------------------------------
// Firmware
// ---------------------------------------------------------------------------

/// Write `1` to reboot into the bootloader.
pub const JUMP_TO_BOOTLOADER: u8 = 0xFD;

pub const FIRMWARE_VERSION: u8 = 0xFE;

/// Current bus address; writable to re-address the unit.
pub const I2C_ADDRESS: u8 = 0xFF;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

pub const DIRECTION_STOP: u8 = 0x00;
pub const DIRECTION_FORWARD: u8 = 0x01;
pub const DIRECTION_BACKWARD: u8 = 0x02;

/// Factory default bus address.
pub const DEFAULT_ADDRESS: Address = Address::fixed(0x20);

/// Firmware version readable and address register echoing the bus address.
pub const IDENTITY: Identity = Identity {
    name: "M5 H-Bridge",
    registers: &[
        IdRegister {
            register: FIRMWARE_VERSION,
            expected: Match::Any,
        },
        IdRegister {
            register: I2C_ADDRESS,
            expected: Match::BusAddress,
        },
    ],
};
