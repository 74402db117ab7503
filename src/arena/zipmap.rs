//! Zipmap decoding: the legacy packed hash representation predating
//! ziplist-encoded hashes.

use bytes::Bytes;

use crate::error::{ErrorKind, ParseError, Result};

/// A decoded zipmap field/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipmapEntry {
    pub field: Bytes,
    pub value: Bytes,
}

/// A lazy iterator over zipmap field/value pairs, positioned just past the
/// one-byte entry-count header.
pub struct ZipmapEntries<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

/// Parse the one-byte header and return an iterator over its entries.
pub fn parse(buf: &[u8]) -> Result<ZipmapEntries<'_>> {
    if buf.is_empty() {
        return Err(ParseError::new(ErrorKind::CorruptZiplist, "zipmap header truncated"));
    }
    Ok(ZipmapEntries { buf, pos: 1, done: false })
}

impl<'a> Iterator for ZipmapEntries<'a> {
    type Item = Result<ZipmapEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_one() {
            Ok(None) => {
                self.done = true;
                None
            }
            Ok(Some(entry)) => Some(Ok(entry)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a> ZipmapEntries<'a> {
    fn byte(&self, at: usize) -> Result<u8> {
        self.buf
            .get(at)
            .copied()
            .ok_or_else(|| ParseError::new(ErrorKind::CorruptZiplist, "zipmap entry truncated"))
    }

    fn slice(&self, at: usize, len: usize) -> Result<&'a [u8]> {
        self.buf
            .get(at..at + len)
            .ok_or_else(|| ParseError::new(ErrorKind::CorruptZiplist, "zipmap entry truncated"))
    }

    /// A zipmap length field: values < 254 are inline, 254 introduces a
    /// 4-byte little-endian length, 255 is the end-of-map sentinel.
    fn read_length(&self, at: usize) -> Result<Option<(usize, usize)>> {
        let marker = self.byte(at)?;
        match marker {
            255 => Ok(None),
            254 => {
                let raw = self.slice(at + 1, 4)?;
                let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
                Ok(Some((len, 5)))
            }
            small => Ok(Some((small as usize, 1))),
        }
    }

    fn read_one(&mut self) -> Result<Option<ZipmapEntry>> {
        let Some((key_len, key_len_width)) = self.read_length(self.pos)? else {
            self.pos += 1;
            return Ok(None);
        };
        let key_start = self.pos + key_len_width;
        let field = self.slice(key_start, key_len)?;
        let value_len_pos = key_start + key_len;

        let Some((value_len, value_len_width)) = self.read_length(value_len_pos)? else {
            return Err(ParseError::new(
                ErrorKind::CorruptZiplist,
                "zipmap ended between key and value",
            ));
        };
        let free_pos = value_len_pos + value_len_width;
        let free = self.byte(free_pos)? as usize;
        let value_start = free_pos + 1;
        let value = self.slice(value_start, value_len)?;

        self.pos = value_start + value_len + free;
        Ok(Some(ZipmapEntry {
            field: Bytes::copy_from_slice(field),
            value: Bytes::copy_from_slice(value),
        }))
    }
}
