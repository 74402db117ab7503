//! String decoding (§4.C): raw, integer-encoded, and LZF-compressed strings.

use std::io::Read;

use bytes::Bytes;

use crate::byte_reader::ByteReader;
use crate::error::Result;
use crate::length::{decode_length, decode_length_or_special, LengthOrSpecial, SpecialEncoding};
use crate::lzf;

/// A decoded string together with the raw bytes that encoded it. `value` is
/// `None` when the caller asked to elide the logical value (an ignore flag);
/// `raw` is always populated so raw-span fidelity is preserved regardless.
pub struct DecodedString {
    pub value: Option<Bytes>,
    pub raw: Bytes,
}

/// Read one RDB string, honoring `keep_value` (false when an ignore flag
/// says the caller only needs the raw span, not the decoded bytes).
pub fn read_string<R: Read>(reader: &mut ByteReader<R>, keep_value: bool) -> Result<DecodedString> {
    let (prefix, mut raw) = decode_length_or_special(reader)?;
    match prefix {
        LengthOrSpecial::Length(len) => {
            let body = reader.read_exact(len)?;
            let mut full = Vec::with_capacity(raw.len() + body.len());
            full.extend_from_slice(&raw);
            full.extend_from_slice(&body);
            Ok(DecodedString {
                value: if keep_value { Some(body) } else { None },
                raw: Bytes::from(full),
            })
        }
        LengthOrSpecial::Special(SpecialEncoding::Int8) => {
            let (v, body) = reader.read_i8()?;
            extend(&mut raw, &body);
            Ok(finish(keep_value, v.to_string(), raw))
        }
        LengthOrSpecial::Special(SpecialEncoding::Int16) => {
            let (v, body) = reader.read_i16_le()?;
            extend(&mut raw, &body);
            Ok(finish(keep_value, v.to_string(), raw))
        }
        LengthOrSpecial::Special(SpecialEncoding::Int32) => {
            let (v, body) = reader.read_i32_le()?;
            extend(&mut raw, &body);
            Ok(finish(keep_value, v.to_string(), raw))
        }
        LengthOrSpecial::Special(SpecialEncoding::Lzf) => {
            let (clen, clen_raw) = decode_length(reader)?;
            extend(&mut raw, &clen_raw);
            let (ulen, ulen_raw) = decode_length(reader)?;
            extend(&mut raw, &ulen_raw);
            let compressed = reader.read_exact(clen)?;
            extend(&mut raw, &compressed);
            let decompressed = lzf::decompress(&compressed, ulen)?;
            Ok(DecodedString {
                value: if keep_value { Some(Bytes::from(decompressed)) } else { None },
                raw: Bytes::from(raw),
            })
        }
    }
}

fn extend(raw: &mut Vec<u8>, more: &[u8]) {
    raw.extend_from_slice(more);
}

fn finish(keep_value: bool, decimal: String, raw: Vec<u8>) -> DecodedString {
    DecodedString {
        value: if keep_value { Some(Bytes::from(decimal.into_bytes())) } else { None },
        raw: Bytes::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: Vec<u8>) -> ByteReader<Cursor<Vec<u8>>> {
        ByteReader::new(Cursor::new(bytes))
    }

    #[test]
    fn raw_string() {
        let mut r = reader(vec![0x03, b'f', b'o', b'o']);
        let s = read_string(&mut r, true).unwrap();
        assert_eq!(s.value.unwrap(), &b"foo"[..]);
        assert_eq!(&s.raw[..], &[0x03, b'f', b'o', b'o']);
    }

    #[test]
    fn int8_encoded_string() {
        let mut r = reader(vec![0xC0, 42]);
        let s = read_string(&mut r, true).unwrap();
        assert_eq!(s.value.unwrap(), &b"42"[..]);
    }

    #[test]
    fn int16_encoded_string() {
        let mut r = reader(vec![0xC1, 0x2C, 0x01]); // 300 little-endian
        let s = read_string(&mut r, true).unwrap();
        assert_eq!(s.value.unwrap(), &b"300"[..]);
    }

    #[test]
    fn elided_value_still_captures_raw() {
        let mut r = reader(vec![0x03, b'f', b'o', b'o']);
        let s = read_string(&mut r, false).unwrap();
        assert!(s.value.is_none());
        assert_eq!(s.raw.len(), 4);
    }

    #[test]
    fn lzf_encoded_string() {
        // length=3 literal "foo", compressed length 4 (ctrl byte + 3 literal bytes), uncompressed length 3
        let mut body = vec![0xC3, 0x04, 0x03];
        body.extend_from_slice(&[0x02, b'f', b'o', b'o']);
        let mut r = reader(body);
        let s = read_string(&mut r, true).unwrap();
        assert_eq!(s.value.unwrap(), &b"foo"[..]);
    }
}
