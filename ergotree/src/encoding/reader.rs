use crate::{
    config::CodecConfig,
    encoding::integer::{decode_u64, unzigzag_i32, unzigzag_i64},
    utils::Error,
};

/// Cursor over a borrowed byte buffer.
///
/// The reader never copies the input; decoded structures own their data so the
/// buffer can be dropped as soon as decoding returns.
#[derive(Debug, Clone)]
pub struct SigmaReader<'a> {
    buf: &'a [u8],
    pos: usize,
    config: CodecConfig,
}

impl<'a> SigmaReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_config(buf, CodecConfig::default())
    }

    pub fn with_config(buf: &'a [u8], config: CodecConfig) -> Self {
        Self {
            buf,
            pos: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Offset of the next byte to be read.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, Error> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(Error::UnexpectedEndOfInput { needed: 1 })
    }

    pub fn get_u8(&mut self) -> Result<u8, Error> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < len {
            return Err(Error::UnexpectedEndOfInput {
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a `u32` length prefix followed by that many bytes.
    pub fn get_len_prefixed_bytes(&mut self) -> Result<&'a [u8], Error> {
        let len = self.get_len()?;
        self.get_bytes(len)
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Ok(out)
    }

    pub fn get_u64(&mut self) -> Result<u64, Error> {
        let mut rest = &self.buf[self.pos..];
        let before = rest.len();
        let value = decode_u64(&mut rest)?;
        self.pos += before - rest.len();
        Ok(value)
    }

    pub fn get_u32(&mut self) -> Result<u32, Error> {
        let value = self.get_u64()?;
        u32::try_from(value).map_err(|_| Error::ValueOutOfRange {
            value,
            max: u32::MAX as u64,
        })
    }

    pub fn get_u16(&mut self) -> Result<u16, Error> {
        let value = self.get_u64()?;
        u16::try_from(value).map_err(|_| Error::ValueOutOfRange {
            value,
            max: u16::MAX as u64,
        })
    }

    /// Read a `u32` length prefix.
    #[inline]
    pub fn get_len(&mut self) -> Result<usize, Error> {
        Ok(self.get_u32()? as usize)
    }

    pub fn get_i16(&mut self) -> Result<i16, Error> {
        let value = self.get_i32()?;
        i16::try_from(value).map_err(|_| Error::ValueOutOfRange {
            value: value.unsigned_abs() as u64,
            max: i16::MAX as u64,
        })
    }

    pub fn get_i32(&mut self) -> Result<i32, Error> {
        let raw = self.get_u64()?;
        if raw > u32::MAX as u64 {
            return Err(Error::ValueOutOfRange {
                value: raw,
                max: u32::MAX as u64,
            });
        }
        Ok(unzigzag_i32(raw))
    }

    pub fn get_i64(&mut self) -> Result<i64, Error> {
        Ok(unzigzag_i64(self.get_u64()?))
    }

    /// Read `count` booleans packed least-significant bit first.
    pub fn get_bits(&mut self, count: usize) -> Result<Vec<bool>, Error> {
        let bytes = self.get_bytes(count.div_ceil(8))?;
        Ok((0..count).map(|i| bytes[i / 8] & (1 << (i % 8)) != 0).collect())
    }

    /// Read a `0`/`1` presence flag followed by the value when present.
    pub fn get_option<T>(
        &mut self,
        mut get: impl FnMut(&mut Self) -> Result<T, Error>,
    ) -> Result<Option<T>, Error> {
        match self.get_u8()? {
            0 => Ok(None),
            1 => get(self).map(Some),
            flag => Err(Error::TypeValueMismatch {
                expected: "option flag 0 or 1".into(),
                found: format!("{flag:#04x}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SigmaWriter;

    #[test]
    fn reads_back_writer_output() {
        let mut w = SigmaWriter::new();
        w.put_u8(0x10);
        w.put_u32(2);
        w.put_i32(-720);
        w.put_i64(i64::MIN);
        w.put_bits(&[true, true, false]);
        let bytes = w.into_bytes();

        let mut r = SigmaReader::new(&bytes);
        assert_eq!(r.get_u8(), Ok(0x10));
        assert_eq!(r.get_u32(), Ok(2));
        assert_eq!(r.get_i32(), Ok(-720));
        assert_eq!(r.get_i64(), Ok(i64::MIN));
        assert_eq!(r.get_bits(3), Ok(vec![true, true, false]));
        assert!(r.is_empty());
        assert_eq!(r.position(), bytes.len());
    }

    #[test]
    fn reading_past_end_fails() {
        let mut r = SigmaReader::new(&[0x01, 0x02]);
        assert_eq!(
            r.get_bytes(5),
            Err(Error::UnexpectedEndOfInput { needed: 3 })
        );
        assert_eq!(r.position(), 0, "failed read must not advance the cursor");
        assert_eq!(r.get_array::<2>(), Ok([0x01, 0x02]));
        assert_eq!(r.get_u8(), Err(Error::UnexpectedEndOfInput { needed: 1 }));
    }

    #[test]
    fn bounded_reads_reject_wide_values() {
        let mut w = SigmaWriter::new();
        w.put_u64(70_000);
        let bytes = w.into_bytes();
        let mut r = SigmaReader::new(&bytes);
        assert!(r.get_u16().unwrap_err().is_value_out_of_range());
    }

    #[test]
    fn short_range_is_checked() {
        let mut w = SigmaWriter::new();
        w.put_i32(40_000);
        let bytes = w.into_bytes();
        assert!(SigmaReader::new(&bytes).get_i16().is_err());
    }
}
