use crate::errors::{Error, Result};

/// io_size_u64s returns the persisted footprint of a `u64` array:
/// a `u32` length prefix followed by the packed words.
#[inline]
pub fn io_size_u64s(n: usize) -> usize {
    n * 8 + 4
}

/// io_size_u32s returns the persisted footprint of a `u32` array.
#[inline]
pub fn io_size_u32s(n: usize) -> usize {
    n * 4 + 4
}

/// io_size_u16s returns the persisted footprint of a `u16` array.
#[inline]
pub fn io_size_u16s(n: usize) -> usize {
    n * 2 + 4
}

/// Encodes a string into UTF-16 code units.
#[inline]
pub fn to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Decodes UTF-16 code units back into a `String`.
///
/// Unpaired surrogates are replaced; sequences produced by [`to_utf16`]
/// decode exactly.
#[inline]
pub fn from_utf16(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Little-endian cursor over a persisted buffer.
///
/// Every read is bounds-checked; running past the end reports a malformed
/// buffer instead of panicking.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(Error::Malformed("truncated buffer"))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}
