//! Base-128 variable-width integers used by INDX entries and record trailers.
//!
//! Each byte carries seven payload bits. The most significant bit marks the
//! byte that terminates the number, which is the last byte read in either
//! scanning direction:
//!
//! ```text
//! Forward:  [0ggggggg] [0ggggggg] [1ggggggg]    most significant group first
//! Backward: [1ggggggg] [0ggggggg] [0ggggggg]    read from the end, least significant group first
//! ```

use crate::mobi::types::error::{MobiError, Result};

const STOP_FLAG: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Scanning direction of a variable-width integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Read from the start of the slice towards its end.
    Forward,
    /// Read from the end of the slice towards its start.
    Backward,
}

/// Decode one integer from `bytes`, returning the value and the number of bytes consumed.
///
/// Forward decoding consumes a prefix of `bytes`; backward decoding consumes a suffix.
pub fn decode(bytes: &[u8], direction: Direction) -> Result<(u32, usize)> {
    match direction {
        Direction::Forward => decode_forward(bytes),
        Direction::Backward => decode_backward(bytes),
    }
}

fn decode_forward(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        if value > u32::MAX >> 7 {
            return Err(MobiError::IntegerOverflow { consumed: i + 1 });
        }
        value = (value << 7) | (byte & PAYLOAD_MASK) as u32;
        if byte & STOP_FLAG != 0 {
            return Ok((value, i + 1));
        }
    }
    Err(unterminated(bytes.len()))
}

fn decode_backward(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    for (i, &byte) in bytes.iter().rev().enumerate() {
        let payload = (byte & PAYLOAD_MASK) as u32;
        if payload != 0 && (shift >= 32 || payload.leading_zeros() < shift) {
            return Err(MobiError::IntegerOverflow { consumed: i + 1 });
        }
        if shift < 32 {
            value |= payload << shift;
        }
        if byte & STOP_FLAG != 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }
    Err(unterminated(bytes.len()))
}

fn unterminated(available: usize) -> MobiError {
    MobiError::TruncatedInput {
        context: "variable-width integer",
        offset: available,
        needed: available + 1,
        available,
    }
}

/// Encode `value` using the fewest bytes possible.
pub fn encode(value: u32, direction: Direction) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    encode_into(value, direction, &mut out);
    out
}

/// Append the encoding of `value` to `buf`.
pub fn encode_into(value: u32, direction: Direction, buf: &mut Vec<u8>) {
    let start = buf.len();
    let mut groups = 1;
    while groups < 5 && value >> (7 * groups) != 0 {
        groups += 1;
    }
    for i in (0..groups).rev() {
        buf.push(((value >> (7 * i)) as u8) & PAYLOAD_MASK);
    }
    match direction {
        Direction::Forward => {
            if let Some(last) = buf.last_mut() {
                *last |= STOP_FLAG;
            }
        }
        Direction::Backward => buf[start] |= STOP_FLAG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_byte_values() {
        assert_eq!(decode(&[0x80], Direction::Forward).unwrap(), (0, 1));
        assert_eq!(decode(&[0xFF], Direction::Forward).unwrap(), (127, 1));
        assert_eq!(encode(127, Direction::Forward), vec![0xFF]);
    }

    #[test]
    fn forward_multi_byte() {
        // 0x01 << 7 | 0x00 = 128
        assert_eq!(decode(&[0x01, 0x80], Direction::Forward).unwrap(), (128, 2));
        assert_eq!(encode(128, Direction::Forward), vec![0x01, 0x80]);
        assert_eq!(encode(300, Direction::Forward), vec![0x02, 0xAC]);
    }

    #[test]
    fn forward_stops_at_flag() {
        let bytes = [0x02, 0xAC, 0x85, 0x01];
        assert_eq!(decode(&bytes, Direction::Forward).unwrap(), (300, 2));
        assert_eq!(decode(&bytes[2..], Direction::Forward).unwrap(), (5, 1));
    }

    #[test]
    fn backward_reads_suffix() {
        // trailing bytes of a text record: [junk][1 0000010][0 0101100]
        let bytes = [0x55, 0x82, 0x2C];
        assert_eq!(decode(&bytes, Direction::Backward).unwrap(), (300, 2));
        assert_eq!(encode(300, Direction::Backward), vec![0x82, 0x2C]);
    }

    #[test]
    fn unterminated_is_truncated() {
        assert!(matches!(
            decode(&[0x01, 0x02], Direction::Forward),
            Err(MobiError::TruncatedInput { available: 2, .. })
        ));
        assert!(matches!(
            decode(&[], Direction::Backward),
            Err(MobiError::TruncatedInput { available: 0, .. })
        ));
    }

    #[test]
    fn overflow_is_rejected() {
        // Five full groups need 35 bits.
        let bytes = [0x7F, 0x7F, 0x7F, 0x7F, 0xFF];
        assert!(matches!(
            decode(&bytes, Direction::Forward),
            Err(MobiError::IntegerOverflow { .. })
        ));
        let bytes = [0xFF, 0x7F, 0x7F, 0x7F, 0x7F];
        assert!(matches!(
            decode(&bytes, Direction::Backward),
            Err(MobiError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn u32_max_fits() {
        let bytes = encode(u32::MAX, Direction::Forward);
        assert_eq!(bytes.len(), 5);
        assert_eq!(decode(&bytes, Direction::Forward).unwrap(), (u32::MAX, 5));
        let bytes = encode(u32::MAX, Direction::Backward);
        assert_eq!(decode(&bytes, Direction::Backward).unwrap(), (u32::MAX, 5));
    }

    proptest! {
        #[test]
        fn round_trip(value in any::<u32>(), backward in any::<bool>()) {
            let direction = if backward { Direction::Backward } else { Direction::Forward };
            let bytes = encode(value, direction);
            prop_assert_eq!(decode(&bytes, direction).unwrap(), (value, bytes.len()));
        }
    }
}
