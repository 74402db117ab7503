//! Fixed-width integer reads over any [`Read`] source, with the exact bytes
//! consumed captured alongside every decoded value so callers can re-emit a
//! byte-faithful copy of the input.

use std::io::Read;

use bytes::Bytes;

use crate::error::{ErrorKind, ParseError, Result};

/// Thin wrapper around a `Read` source that turns short reads into
/// [`ErrorKind::Truncated`] and hands back the raw bytes of every read.
pub struct ByteReader<R> {
    inner: R,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        ByteReader { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read exactly `n` bytes, returning them as an owned, cheaply-clonable
    /// buffer. This is the primitive every other read in this module and
    /// every decoder in this crate is built on.
    pub fn read_exact(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; n];
        self.inner
            .read_exact(&mut buf)
            .map_err(|_| ParseError::truncated(&format!("{n} bytes")))?;
        Ok(Bytes::from(buf))
    }

    pub fn skip(&mut self, n: usize) -> Result<Bytes> {
        self.read_exact(n)
    }

    pub fn read_u8(&mut self) -> Result<(u8, Bytes)> {
        let raw = self.read_exact(1)?;
        Ok((raw[0], raw))
    }

    pub fn read_i8(&mut self) -> Result<(i8, Bytes)> {
        let raw = self.read_exact(1)?;
        Ok((raw[0] as i8, raw))
    }

    pub fn read_u16_le(&mut self) -> Result<(u16, Bytes)> {
        let raw = self.read_exact(2)?;
        Ok((u16::from_le_bytes([raw[0], raw[1]]), raw))
    }

    pub fn read_i16_le(&mut self) -> Result<(i16, Bytes)> {
        let raw = self.read_exact(2)?;
        Ok((i16::from_le_bytes([raw[0], raw[1]]), raw))
    }

    pub fn read_u32_le(&mut self) -> Result<(u32, Bytes)> {
        let raw = self.read_exact(4)?;
        Ok((u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]), raw))
    }

    pub fn read_i32_le(&mut self) -> Result<(i32, Bytes)> {
        let raw = self.read_exact(4)?;
        Ok((i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]), raw))
    }

    /// Read a 4-byte big-endian unsigned integer (used by the `10`-tagged
    /// length prefix and the 32-bit ziplist entry length header).
    pub fn read_u32_be(&mut self) -> Result<(u32, Bytes)> {
        let raw = self.read_exact(4)?;
        Ok((u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]), raw))
    }

    pub fn read_u64_le(&mut self) -> Result<(u64, Bytes)> {
        let raw = self.read_exact(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&raw);
        Ok((u64::from_le_bytes(arr), raw))
    }

    pub fn read_i64_le(&mut self) -> Result<(i64, Bytes)> {
        let raw = self.read_exact(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&raw);
        Ok((i64::from_le_bytes(arr), raw))
    }

    /// Read a 3-byte little-endian two's-complement integer, sign-extended
    /// to `i32` (the ziplist `11110000` entry encoding).
    pub fn read_i24_le(&mut self) -> Result<(i32, Bytes)> {
        let raw = self.read_exact(3)?;
        let unsigned = (raw[0] as u32) | ((raw[1] as u32) << 8) | ((raw[2] as u32) << 16);
        let signed = if unsigned & 0x0080_0000 != 0 {
            (unsigned | 0xFF00_0000) as i32
        } else {
            unsigned as i32
        };
        Ok((signed, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_little_endian_widths() {
        let mut r = ByteReader::new(Cursor::new(vec![0x01, 0x02, 0x03, 0x04]));
        let (v, raw) = r.read_u32_le().unwrap();
        assert_eq!(v, 0x04030201);
        assert_eq!(&raw[..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn reads_big_endian_u32() {
        let mut r = ByteReader::new(Cursor::new(vec![0x00, 0x00, 0x01, 0x00]));
        let (v, _) = r.read_u32_be().unwrap();
        assert_eq!(v, 256);
    }

    #[test]
    fn reads_i24_sign_extends_negative() {
        let mut r = ByteReader::new(Cursor::new(vec![0xFF, 0xFF, 0xFF]));
        let (v, _) = r.read_i24_le().unwrap();
        assert_eq!(v, -1);
    }

    #[test]
    fn reads_i24_positive() {
        let mut r = ByteReader::new(Cursor::new(vec![0x01, 0x00, 0x00]));
        let (v, _) = r.read_i24_le().unwrap();
        assert_eq!(v, 1);
    }

    #[test]
    fn short_read_is_truncated_error() {
        let mut r = ByteReader::new(Cursor::new(vec![0x01]));
        let err = r.read_u32_le().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Truncated);
    }
}
