//! Length/encoding prefix decoding (RDB's 2-bit-tagged length byte).

use std::io::Read;

use bytes::Bytes;

use crate::byte_reader::ByteReader;
use crate::error::{ErrorKind, ParseError, Result};

/// The special-encoding discriminant carried by a `11`-tagged length byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialEncoding {
    Int8,
    Int16,
    Int32,
    Lzf,
}

impl SpecialEncoding {
    fn from_discriminant(d: u8) -> Result<Self> {
        match d {
            0 => Ok(SpecialEncoding::Int8),
            1 => Ok(SpecialEncoding::Int16),
            2 => Ok(SpecialEncoding::Int32),
            3 => Ok(SpecialEncoding::Lzf),
            other => Err(ParseError::new(
                ErrorKind::UnknownStringEncoding,
                format!("unrecognized special encoding discriminant {other}"),
            )),
        }
    }
}

/// The result of decoding one length/encoding prefix: either a plain length
/// or a special encoding discriminant, always paired with the exact bytes
/// that were consumed to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LengthOrSpecial {
    Length(usize),
    Special(SpecialEncoding),
}

/// Decode one length/encoding prefix (§4.B). Returns the decoded value and
/// the raw bytes consumed.
pub fn decode_length_or_special<R: Read>(
    reader: &mut ByteReader<R>,
) -> Result<(LengthOrSpecial, Bytes)> {
    let (first, raw0) = reader.read_u8()?;
    match first >> 6 {
        0b00 => {
            let len = (first & 0x3F) as usize;
            Ok((LengthOrSpecial::Length(len), raw0))
        }
        0b01 => {
            let (second, raw1) = reader.read_u8()?;
            let len = ((first & 0x3F) as usize) << 8 | second as usize;
            let mut raw = Vec::with_capacity(2);
            raw.extend_from_slice(&raw0);
            raw.extend_from_slice(&raw1);
            Ok((LengthOrSpecial::Length(len), Bytes::from(raw)))
        }
        0b10 => {
            let (len, raw1) = reader.read_u32_be()?;
            let mut raw = Vec::with_capacity(5);
            raw.extend_from_slice(&raw0);
            raw.extend_from_slice(&raw1);
            Ok((LengthOrSpecial::Length(len as usize), Bytes::from(raw)))
        }
        0b11 => {
            let discriminant = first & 0x3F;
            let special = SpecialEncoding::from_discriminant(discriminant)?;
            Ok((LengthOrSpecial::Special(special), raw0))
        }
        _ => unreachable!("a two-bit shift only produces four cases"),
    }
}

/// Decode a length prefix that must not be a special encoding.
pub fn decode_length<R: Read>(reader: &mut ByteReader<R>) -> Result<(usize, Bytes)> {
    match decode_length_or_special(reader)? {
        (LengthOrSpecial::Length(len), raw) => Ok((len, raw)),
        (LengthOrSpecial::Special(_), _) => Err(ParseError::new(
            ErrorKind::UnknownStringEncoding,
            "expected a plain length, found a special encoding",
        )),
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
    fn six_bit_length() {
        let mut r = reader(vec![0x0A]);
        let (v, raw) = decode_length_or_special(&mut r).unwrap();
        assert_eq!(v, LengthOrSpecial::Length(10));
        assert_eq!(&raw[..], &[0x0A]);
    }

    #[test]
    fn fourteen_bit_length() {
        // 0x42 = 01 000010, second byte 0x2A -> (0x02 << 8) | 0x2A = 554
        let mut r = reader(vec![0x42, 0x2A]);
        let (v, raw) = decode_length_or_special(&mut r).unwrap();
        assert_eq!(v, LengthOrSpecial::Length(554));
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn thirty_two_bit_length() {
        let mut r = reader(vec![0x80, 0x00, 0x01, 0x00, 0x00]);
        let (v, raw) = decode_length_or_special(&mut r).unwrap();
        assert_eq!(v, LengthOrSpecial::Length(0x0001_0000));
        assert_eq!(raw.len(), 5);
    }

    #[test]
    fn special_encoding_discriminant() {
        let mut r = reader(vec![0xC0]);
        let (v, _) = decode_length_or_special(&mut r).unwrap();
        assert_eq!(v, LengthOrSpecial::Special(SpecialEncoding::Int8));
    }

    #[test]
    fn unknown_special_encoding_is_an_error() {
        let mut r = reader(vec![0xC7]); // discriminant 7, undefined
        let err = decode_length_or_special(&mut r).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownStringEncoding);
    }

    #[test]
    fn round_trip_through_raw_bytes() {
        let mut r = reader(vec![0x42, 0x2A]);
        let (v, raw) = decode_length_or_special(&mut r).unwrap();
        let mut r2 = reader(raw.to_vec());
        let (v2, raw2) = decode_length_or_special(&mut r2).unwrap();
        assert_eq!(v, v2);
        assert_eq!(raw, raw2);
    }

    #[test]
    fn decode_length_rejects_special() {
        let mut r = reader(vec![0xC0]);
        let err = decode_length(&mut r).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownStringEncoding);
    }
}
