//! Register framing and typed value encode/decode.
//!
//! Devices on the same bus disagree on byte order, so nothing here has a
//! default: every multi-byte conversion takes an [`Endian`] and the call
//! site states which one the register uses.

use heapless::Vec;

use crate::error::Argument;
use crate::motor::DutyCycle;

/// Longest register payload in a single write frame.
pub const MAX_PAYLOAD: usize = 16;

/// Register selector byte followed by up to [`MAX_PAYLOAD`] value bytes.
pub type Frame = Vec<u8, { MAX_PAYLOAD + 1 }>;

/// Byte order of a multi-byte register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endian {
    Little,
    Big,
}

/// Width of an analog-input register view.
///
/// Units with ADC inputs expose the same sample twice: one byte, and a
/// 12-bit value in a little-endian u16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcResolution {
    Bits8,
    Bits12,
}

/// Prepend the register selector to `payload`.
pub fn encode_write(register: u8, payload: &[u8]) -> Result<Frame, Argument> {
    let mut frame = Frame::new();
    frame.push(register).map_err(|_| Argument::Payload)?;
    frame
        .extend_from_slice(payload)
        .map_err(|_| Argument::Payload)?;
    Ok(frame)
}

/// Encode `value` into `out`, whose length (1–4) is the field width.
///
/// Fails with [`Argument::Width`] if the width is unsupported or `value`
/// does not fit in it.
pub fn encode_unsigned(value: u32, out: &mut [u8], endian: Endian) -> Result<(), Argument> {
    let width = out.len();
    if !(1..=4).contains(&width) {
        return Err(Argument::Width);
    }
    if width < 4 && value >> (8 * width) != 0 {
        return Err(Argument::Width);
    }

    let bytes = value.to_le_bytes();
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = match endian {
            Endian::Little => bytes[i],
            Endian::Big => bytes[width - 1 - i],
        };
    }
    Ok(())
}

/// Reconstruct an unsigned integer from 1–4 bytes.
pub fn decode_unsigned(bytes: &[u8], endian: Endian) -> Result<u32, Argument> {
    if !(1..=4).contains(&bytes.len()) {
        return Err(Argument::Width);
    }

    let fold = |acc: u32, b: &u8| (acc << 8) | u32::from(*b);
    Ok(match endian {
        Endian::Big => bytes.iter().fold(0, fold),
        Endian::Little => bytes.iter().rev().fold(0, fold),
    })
}

/// Reconstruct a two's-complement integer from 1–4 bytes, sign-extending
/// from the field's top bit.
pub fn decode_signed(bytes: &[u8], endian: Endian) -> Result<i32, Argument> {
    let raw = decode_unsigned(bytes, endian)?;
    let shift = 32 - 8 * bytes.len() as u32;
    Ok(((raw << shift) as i32) >> shift)
}

/// Reinterpret a 16-bit register as two's complement: values with bit 15
/// set map to `value - 65536`.
pub fn decode_signed16(bytes: [u8; 2], endian: Endian) -> i16 {
    let raw = match endian {
        Endian::Little => u16::from_le_bytes(bytes),
        Endian::Big => u16::from_be_bytes(bytes),
    };
    if raw & 0x8000 != 0 {
        (i32::from(raw) - 0x1_0000) as i16
    } else {
        raw as i16
    }
}

/// Encode a duty cycle as the `(whole percent, tenths)` register pair.
///
/// Both bytes truncate: `57.36` becomes `(57, 3)` and `33.75` becomes
/// `(33, 7)`. Precision below one tenth is lost; this matches the motor
/// controller's register resolution and existing firmware expects exactly
/// these bytes.
pub fn encode_duty_cycle(duty: DutyCycle) -> [u8; 2] {
    let percent = duty.percent();
    let whole = percent as u8;
    let tenths = ((percent * 10.0) as u16 % 10) as u8;
    [whole, tenths]
}

/// Reinterpret four little-endian bytes as an IEEE-754 single.
pub fn decode_f32_le(bytes: [u8; 4]) -> f32 {
    f32::from_le_bytes(bytes)
}

// ── Unit Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn duty(percent: f32) -> DutyCycle {
        DutyCycle::new(percent).unwrap()
    }

    // ── Framing ──────────────────────────────────────────────────────

    #[test]
    fn encode_write_prepends_register() {
        let frame = encode_write(0x0f, &[0x01, 0x02]).unwrap();
        assert_eq!(frame.as_slice(), &[0x0f, 0x01, 0x02]);
    }

    #[test]
    fn encode_write_register_only() {
        let frame = encode_write(0x20, &[]).unwrap();
        assert_eq!(frame.as_slice(), &[0x20]);
    }

    #[test]
    fn encode_write_rejects_oversized_payload() {
        let payload = [0u8; MAX_PAYLOAD + 1];
        assert_eq!(encode_write(0x00, &payload), Err(Argument::Payload));
        assert!(encode_write(0x00, &payload[..MAX_PAYLOAD]).is_ok());
    }

    // ── Unsigned ─────────────────────────────────────────────────────

    #[test]
    fn unsigned_byte_order() {
        assert_eq!(decode_unsigned(&[0x34, 0x12], Endian::Little), Ok(0x1234));
        assert_eq!(decode_unsigned(&[0x12, 0x34], Endian::Big), Ok(0x1234));
        assert_eq!(
            decode_unsigned(&[0x01, 0x02, 0x03], Endian::Big),
            Ok(0x01_02_03)
        );
        assert_eq!(
            decode_unsigned(&[0x78, 0x56, 0x34, 0x12], Endian::Little),
            Ok(0x1234_5678)
        );
    }

    #[test]
    fn unsigned_width_checks() {
        assert_eq!(decode_unsigned(&[], Endian::Little), Err(Argument::Width));
        assert_eq!(decode_unsigned(&[0; 5], Endian::Big), Err(Argument::Width));

        let mut two = [0u8; 2];
        assert_eq!(
            encode_unsigned(0x1_0000, &mut two, Endian::Little),
            Err(Argument::Width)
        );
        let mut none: [u8; 0] = [];
        assert_eq!(
            encode_unsigned(0, &mut none, Endian::Little),
            Err(Argument::Width)
        );
    }

    #[test]
    fn encode_unsigned_byte_order() {
        let mut buf = [0u8; 2];
        encode_unsigned(1500, &mut buf, Endian::Little).unwrap();
        assert_eq!(buf, [0xdc, 0x05]);
        encode_unsigned(2000, &mut buf, Endian::Big).unwrap();
        assert_eq!(buf, [0x07, 0xd0]);

        let mut word = [0u8; 4];
        encode_unsigned(0xdead_beef, &mut word, Endian::Big).unwrap();
        assert_eq!(word, [0xde, 0xad, 0xbe, 0xef]);
    }

    // ── Signed ───────────────────────────────────────────────────────

    #[test]
    fn signed16_boundaries_little_endian() {
        assert_eq!(decode_signed16([0x00, 0x80], Endian::Little), -32768);
        assert_eq!(decode_signed16([0xff, 0x7f], Endian::Little), 32767);
        assert_eq!(decode_signed16([0xff, 0xff], Endian::Little), -1);
        assert_eq!(decode_signed16([0x00, 0x00], Endian::Little), 0);
    }

    #[test]
    fn signed16_boundaries_big_endian() {
        assert_eq!(decode_signed16([0x80, 0x00], Endian::Big), -32768);
        assert_eq!(decode_signed16([0x7f, 0xff], Endian::Big), 32767);
        assert_eq!(decode_signed16([0xff, 0x38], Endian::Big), -200);
    }

    #[test]
    fn signed_sign_extends_each_width() {
        assert_eq!(decode_signed(&[0x80], Endian::Little), Ok(-128));
        assert_eq!(decode_signed(&[0x7f], Endian::Little), Ok(127));
        assert_eq!(decode_signed(&[0x00, 0x80], Endian::Little), Ok(-32768));
        assert_eq!(decode_signed(&[0xff, 0xff, 0xff], Endian::Big), Ok(-1));
        assert_eq!(
            decode_signed(&[0xfe, 0xff, 0xff, 0xff], Endian::Little),
            Ok(-2)
        );
        assert_eq!(
            decode_signed(&[0x7f, 0xff, 0xff, 0xff], Endian::Big),
            Ok(i32::MAX)
        );
    }

    // ── Duty cycle ───────────────────────────────────────────────────

    #[test]
    fn duty_cycle_whole_and_tenths() {
        assert_eq!(encode_duty_cycle(duty(0.0)), [0, 0]);
        assert_eq!(encode_duty_cycle(duty(12.5)), [12, 5]);
        assert_eq!(encode_duty_cycle(duty(100.0)), [100, 0]);
    }

    #[test]
    fn duty_cycle_truncates_below_one_tenth() {
        // 337.5 tenths truncates to 337, not 338.
        assert_eq!(encode_duty_cycle(duty(33.75)), [33, 7]);
        assert_eq!(encode_duty_cycle(duty(57.36)), [57, 3]);
        assert_eq!(encode_duty_cycle(duty(99.99)), [99, 9]);
    }

    // ── Float ────────────────────────────────────────────────────────

    #[test]
    fn float_little_endian() {
        assert_eq!(decode_f32_le(1.5f32.to_le_bytes()), 1.5);
        assert_eq!(decode_f32_le([0x00, 0x00, 0x80, 0x3f]), 1.0);
        assert_eq!(decode_f32_le([0x00, 0x00, 0x20, 0xc1]), -10.0);
    }
}
