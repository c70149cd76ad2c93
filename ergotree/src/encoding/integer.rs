//! VLQ and zig-zag helpers for the compact integer representation.
//!
//! Unsigned values are written as base-128 digits, least-significant first, with the
//! MSB of every byte but the last set to signal continuation (LEB128). Signed values
//! are zig-zag mapped first so that small negative numbers stay short.

use crate::utils::Error;

/// Longest VLQ accepted when decoding. Ten 7-bit groups cover the full `u64` range.
pub const MAX_VLQ_BYTES: usize = 10;

/// Encode an unsigned 64-bit integer with the base-128 scheme.
///
/// Notes:
/// - Value 0 encodes to a single byte `0x00`.
/// - The encoding for 300 is `[0xAC, 0x02]`.
///
/// Returns the number of bytes emitted.
pub fn encode_u64<F: FnMut(&[u8])>(mut value: u64, encoder: &mut F) -> usize {
    let mut size = 1;
    while value >= 0x80 {
        encoder(&[((value & 0x7F) as u8) | 0x80]);
        value >>= 7;
        size += 1;
    }
    encoder(&[value as u8]);
    size
}

/// Decode one unsigned 64-bit integer from the front of `buf`.
///
/// On success `buf` is advanced past the consumed bytes. A value that never
/// terminates fails with [`Error::UnexpectedEndOfInput`]; one that runs past
/// [`MAX_VLQ_BYTES`] fails with [`Error::VlqOverflow`].
pub fn decode_u64(buf: &mut &[u8]) -> Result<u64, Error> {
    let mut value: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in buf.iter().enumerate() {
        // The tenth group holds bit 63 alone.
        if i >= MAX_VLQ_BYTES || (i == MAX_VLQ_BYTES - 1 && byte > 1) {
            return Err(Error::VlqOverflow);
        }

        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            *buf = &buf[i + 1..];
            return Ok(value);
        }
        shift += 7;
    }

    if buf.len() >= MAX_VLQ_BYTES {
        return Err(Error::VlqOverflow);
    }
    Err(Error::UnexpectedEndOfInput { needed: 1 })
}

/// Zig-zag map a 32-bit signed value (also used for 16-bit values).
#[inline]
pub const fn zigzag_i32(value: i32) -> u64 {
    ((value << 1) ^ (value >> 31)) as u32 as u64
}

/// Inverse of [`zigzag_i32`]. Only the low 32 bits of `value` are meaningful.
#[inline]
pub const fn unzigzag_i32(value: u64) -> i32 {
    let v = value as u32;
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

/// Zig-zag map a 64-bit signed value.
#[inline]
pub const fn zigzag_i64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_i64`].
#[inline]
pub const fn unzigzag_i64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use crate::encoding::DynBuf;

    use super::*;

    fn encode(v: u64) -> DynBuf {
        let mut buf = DynBuf::new();
        encode_u64(v, &mut |b| buf.extend_from_slice(b));
        buf
    }

    #[test]
    fn roundtrip_edge_values() {
        let values = [0_u64, 1, 127, 128, 300, 16383, 16384, u32::MAX as u64, u64::MAX];
        for &v in &values {
            let buf = encode(v);
            let mut s: &[u8] = &buf;
            assert_eq!(decode_u64(&mut s), Ok(v), "value {v} roundtrip");
            assert!(s.is_empty(), "buffer not fully consumed for {v}");
        }
    }

    #[test]
    fn encoding_shape_examples() {
        assert_eq!(&encode(0)[..], &[0x00]);
        assert_eq!(&encode(127)[..], &[0x7F]);
        assert_eq!(&encode(128)[..], &[0x80, 0x01]);
        assert_eq!(&encode(300)[..], &[0xAC, 0x02]);
        assert_eq!(&encode(16384)[..], &[0x80, 0x80, 0x01]);
        assert_eq!(
            &encode(u64::MAX)[..],
            &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
    }

    #[test]
    fn decode_leaves_trailing_bytes() {
        let mut s: &[u8] = &[0xAC, 0x02, 0x73];
        assert_eq!(decode_u64(&mut s), Ok(300));
        assert_eq!(s, &[0x73]);
    }

    #[test]
    fn decode_malformed_no_terminator() {
        let mut s: &[u8] = &[0x80, 0x80];
        assert_eq!(
            decode_u64(&mut s),
            Err(Error::UnexpectedEndOfInput { needed: 1 })
        );
    }

    #[test]
    fn decode_rejects_overlong_values() {
        let mut s: &[u8] = &[0xFF; 11];
        assert_eq!(decode_u64(&mut s), Err(Error::VlqOverflow));
    }

    #[test]
    fn decode_rejects_bits_above_63() {
        let mut bytes = [0xFF; 10];
        bytes[9] = 0x7F;
        let mut s: &[u8] = &bytes;
        assert_eq!(decode_u64(&mut s), Err(Error::VlqOverflow));

        bytes[9] = 0x02;
        let mut s: &[u8] = &bytes;
        assert_eq!(decode_u64(&mut s), Err(Error::VlqOverflow));

        bytes[9] = 0x01;
        let mut s: &[u8] = &bytes;
        assert_eq!(decode_u64(&mut s), Ok(u64::MAX));
    }

    #[test]
    fn zigzag_matches_reference_values() {
        assert_eq!(zigzag_i32(0), 0);
        assert_eq!(zigzag_i32(-1), 1);
        assert_eq!(zigzag_i32(1), 2);
        assert_eq!(zigzag_i32(720), 1440);
        assert_eq!(zigzag_i32(i32::MIN), u32::MAX as u64);
        assert_eq!(unzigzag_i32(1440), 720);
        assert_eq!(unzigzag_i32(u32::MAX as u64), i32::MIN);
        assert_eq!(zigzag_i64(i64::MIN), u64::MAX);
        assert_eq!(unzigzag_i64(u64::MAX), i64::MIN);
        assert_eq!(unzigzag_i64(zigzag_i64(-123_456_789)), -123_456_789);
    }
}
