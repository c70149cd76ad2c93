use crate::encoding::{
    DynBuf,
    integer::{encode_u64, zigzag_i32, zigzag_i64},
};

/// Append-only byte sink.
#[derive(Debug, Default, Clone)]
pub struct SigmaWriter {
    buf: DynBuf,
}

impl SigmaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    #[inline]
    pub fn put_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_u64(&mut self, value: u64) {
        let buf = &mut self.buf;
        encode_u64(value, &mut |b| buf.extend_from_slice(b));
    }

    #[inline]
    pub fn put_u32(&mut self, value: u32) {
        self.put_u64(value as u64);
    }

    #[inline]
    pub fn put_u16(&mut self, value: u16) {
        self.put_u64(value as u64);
    }

    /// Length prefixes are written as `u32` VLQs.
    #[inline]
    pub fn put_len(&mut self, len: usize) {
        debug_assert!(len <= u32::MAX as usize, "length prefix exceeds u32");
        self.put_u32(len as u32);
    }

    pub fn put_len_prefixed_bytes(&mut self, bytes: &[u8]) {
        self.put_len(bytes.len());
        self.put_bytes(bytes);
    }

    #[inline]
    pub fn put_i16(&mut self, value: i16) {
        self.put_u64(zigzag_i32(value as i32));
    }

    #[inline]
    pub fn put_i32(&mut self, value: i32) {
        self.put_u64(zigzag_i32(value));
    }

    #[inline]
    pub fn put_i64(&mut self, value: i64) {
        self.put_u64(zigzag_i64(value));
    }

    /// Pack booleans into bytes, least-significant bit first. The count is not written.
    pub fn put_bits(&mut self, bits: &[bool]) {
        for chunk in bits.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i));
            self.buf.push(byte);
        }
    }

    /// Write `1` and the value, or `0` for `None`.
    pub fn put_option<T>(&mut self, value: Option<&T>, mut put: impl FnMut(&mut Self, &T)) {
        match value {
            Some(v) => {
                self.put_u8(1);
                put(self, v);
            }
            None => self.put_u8(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SigmaReader;

    #[test]
    fn signed_values_are_zigzag_encoded() {
        let mut w = SigmaWriter::new();
        w.put_i32(720);
        w.put_i16(-1);
        w.put_i64(-2);
        assert_eq!(w.as_slice(), &[0xA0, 0x0B, 0x01, 0x03]);
    }

    #[test]
    fn bits_are_packed_lsb_first() {
        let mut w = SigmaWriter::new();
        w.put_bits(&[true, false, true, true, false, false, false, false, true]);
        assert_eq!(w.as_slice(), &[0b0000_1101, 0b0000_0001]);
    }

    #[test]
    fn byte_arrays_carry_their_length() {
        let mut w = SigmaWriter::new();
        w.put_len_prefixed_bytes(&[0xde, 0xad]);
        w.put_len_prefixed_bytes(&[]);
        assert_eq!(w.as_slice(), &[0x02, 0xde, 0xad, 0x00]);

        let bytes = w.into_bytes();
        let mut r = SigmaReader::new(&bytes);
        assert_eq!(r.get_len_prefixed_bytes(), Ok(&[0xde, 0xad][..]));
        assert_eq!(r.get_len_prefixed_bytes(), Ok(&[][..]));
        assert!(r.is_empty());
    }

    #[test]
    fn option_flag_precedes_value() {
        let mut w = SigmaWriter::new();
        w.put_option(Some(&7u8), |w, v| w.put_u8(*v));
        w.put_option(None::<&u8>, |w, v| w.put_u8(*v));
        assert_eq!(w.as_slice(), &[1, 7, 0]);
    }
}
