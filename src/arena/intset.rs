//! Intset decoding: a packed sorted array of fixed-width signed integers
//! used as the compact on-disk representation of small integer sets.

use crate::error::{ErrorKind, ParseError, Result};

/// Decode an intset arena into its signed integer members, in on-disk order.
///
/// The reference implementation this crate is modeled on reads these
/// entries with unsigned integer readers; the Redis intset format defines
/// signed entries, and this decoder reports signed values accordingly.
pub fn decode(buf: &[u8]) -> Result<Vec<i64>> {
    if buf.len() < 8 {
        return Err(ParseError::new(ErrorKind::CorruptIntset, "intset header truncated"));
    }
    let encoding = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let count = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
    let mut entries = Vec::with_capacity(count);
    let mut offset = 8;
    for _ in 0..count {
        let value = match encoding {
            2 => {
                if offset + 2 > buf.len() {
                    return Err(ParseError::new(ErrorKind::CorruptIntset, "intset entry truncated"));
                }
                let v = i16::from_le_bytes([buf[offset], buf[offset + 1]]) as i64;
                offset += 2;
                v
            }
            4 => {
                if offset + 4 > buf.len() {
                    return Err(ParseError::new(ErrorKind::CorruptIntset, "intset entry truncated"));
                }
                let v = i32::from_le_bytes([
                    buf[offset],
                    buf[offset + 1],
                    buf[offset + 2],
                    buf[offset + 3],
                ]) as i64;
                offset += 4;
                v
            }
            8 => {
                if offset + 8 > buf.len() {
                    return Err(ParseError::new(ErrorKind::CorruptIntset, "intset entry truncated"));
                }
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&buf[offset..offset + 8]);
                offset += 8;
                i64::from_le_bytes(arr)
            }
            other => {
                return Err(ParseError::new(
                    ErrorKind::CorruptIntset,
                    format!("unsupported intset encoding width {other}"),
                ))
            }
        };
        entries.push(value);
    }
    Ok(entries)
}
