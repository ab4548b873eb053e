//! Register map of the DFRobot DFR0592 DC Motor Driver HAT.
//!
//! The board exposes two repeated blocks: one per encoder channel
//! (stride 5) and one per motor channel (stride 3). Channel `n` (0-based)
//! lives at `BASE + n * STRIDE`.

use crate::driver::Address;
use crate::probe::{IdRegister, Identity, Match};

// ---------------------------------------------------------------------------
// Board registers
// ---------------------------------------------------------------------------

/// Bus address register (write to re-address the board).
pub const SLAVE_ADDR: u8 = 0x00;

/// Product ID register (read-only).
pub const PID: u8 = 0x01;

/// Version ID register (read-only).
pub const VID: u8 = 0x02;

/// Control mode register. `0` selects DC motor mode.
pub const CTRL_MODE: u8 = 0x03;

/// Global PWM clock, in units of 50 Hz.
pub const MOTOR_PWM: u8 = 0x0E;

// ---------------------------------------------------------------------------
// Encoder blocks
// ---------------------------------------------------------------------------

/// Encoder enable (`1`) / disable (`0`), channel 1.
pub const ENCODER1_EN: u8 = 0x04;

/// Offset of the signed 16-bit big-endian speed within an encoder block.
pub const ENCODER_SPEED_OFFSET: u8 = 1;

/// Offset of the unsigned 16-bit big-endian reduction ratio within an
/// encoder block.
pub const ENCODER_REDUCTION_RATIO_OFFSET: u8 = 3;

/// Distance between consecutive encoder blocks.
pub const ENCODER_STRIDE: u8 = 5;

// ---------------------------------------------------------------------------
// Motor blocks
// ---------------------------------------------------------------------------

/// Orientation register, motor 1. Speed integer and tenths follow it.
pub const MOTOR1_ORIENTATION: u8 = 0x0F;

/// Distance between consecutive motor blocks.
pub const MOTOR_STRIDE: u8 = 3;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// Expected content of [`PID`].
pub const DEF_PID: u8 = 0xDF;

/// Expected content of [`VID`].
pub const DEF_VID: u8 = 0x10;

pub const CTRL_MODE_DC: u8 = 0x00;

pub const ORIENTATION_CW: u8 = 0x01;
pub const ORIENTATION_CCW: u8 = 0x02;
pub const ORIENTATION_STOP: u8 = 0x05;

/// Supported PWM clock range in Hz.
pub const PWM_FREQUENCY_RANGE: core::ops::RangeInclusive<u32> = 100..=12_750;

/// PWM register resolution in Hz.
pub const PWM_FREQUENCY_STEP: u32 = 50;

/// Settle time after a PWM clock change before the board accepts commands.
pub const PWM_SETTLE_MS: u32 = 100;

/// Supported encoder reduction ratios.
pub const REDUCTION_RATIO_RANGE: core::ops::RangeInclusive<u16> = 1..=2000;

/// Factory default bus address.
pub const DEFAULT_ADDRESS: Address = Address::fixed(0x10);

/// Product and version ID check.
pub const IDENTITY: Identity = Identity {
    name: "DFR0592",
    registers: &[
        IdRegister {
            register: PID,
            expected: Match::Exact(DEF_PID),
        },
        IdRegister {
            register: VID,
            expected: Match::Exact(DEF_VID),
        },
    ],
};
