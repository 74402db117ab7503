//! Object dispatcher (§4.F): given a data-type opcode and an already-decoded
//! key, drives the appropriate sub-decoder and emits the element events.

use std::io::Read;

use bytes::Bytes;
use log::debug;

use crate::arena::{intset, zipmap, ziplist};
use crate::byte_reader::ByteReader;
use crate::error::{ErrorKind, ParseError, Result};
use crate::filter::{IgnoreFlags, LogicalType};
use crate::length::decode_length;
use crate::observer::{ElementInfo, FieldInfo, ObjectInfo, Observer, SourceEncoding};
use crate::string::read_string;

pub const TYPE_STRING: u8 = 0;
pub const TYPE_LIST: u8 = 1;
pub const TYPE_SET: u8 = 2;
pub const TYPE_ZSET: u8 = 3;
pub const TYPE_HASH: u8 = 4;
pub const TYPE_ZIPMAP: u8 = 9;
pub const TYPE_ZIPLIST: u8 = 10;
pub const TYPE_INTSET: u8 = 11;
pub const TYPE_ZSET_ZIPLIST: u8 = 12;
pub const TYPE_HASH_ZIPLIST: u8 = 13;

/// Everything the dispatcher needs about the object it is about to decode,
/// gathered by the top-level driver before handing off.
pub struct ObjectHeader {
    pub type_opcode: u8,
    pub type_raw: Bytes,
    pub key: Bytes,
    pub key_raw: Bytes,
    pub expiry_unix_seconds: Option<u64>,
    pub expiry_raw: Option<Bytes>,
}

/// Decode and emit events for one key's object, returning its logical type
/// (used by the caller only for bookkeeping; filtering on type happens
/// before this is called).
pub fn dispatch<R: Read>(
    reader: &mut ByteReader<R>,
    header: ObjectHeader,
    ignore: IgnoreFlags,
    observer: &mut dyn Observer,
) -> Result<LogicalType> {
    let key = header.key.clone();
    match header.type_opcode {
        TYPE_STRING => {
            let value = read_string(reader, true)?;
            let info = crate::observer::ScalarInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw,
                orig_val: value.raw,
            };
            observer.set(&key, value.value.as_deref().unwrap_or(&[]), header.expiry_unix_seconds, &info);
            Ok(LogicalType::String)
        }
        TYPE_LIST => {
            let (len, len_raw) = decode_length(reader)?;
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: Some(len_raw),
                orig_raw_string: None,
                encoding: SourceEncoding::LinkedList,
            };
            observer.start_list(&key, len, header.expiry_unix_seconds, &obj_info);
            for _ in 0..len {
                let v = read_string(reader, true)?;
                let info = ElementInfo { orig_val: v.raw };
                observer.rpush(&key, v.value.as_deref().unwrap_or(&[]), &info);
            }
            observer.end_list(&key);
            Ok(LogicalType::List)
        }
        TYPE_SET => {
            let (len, len_raw) = decode_length(reader)?;
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: Some(len_raw),
                orig_raw_string: None,
                encoding: SourceEncoding::HashTable,
            };
            observer.start_set(&key, len, header.expiry_unix_seconds, &obj_info);
            for _ in 0..len {
                let v = read_string(reader, true)?;
                let info = ElementInfo { orig_val: v.raw };
                observer.sadd(&key, v.value.as_deref().unwrap_or(&[]), &info);
            }
            observer.end_set(&key);
            Ok(LogicalType::Set)
        }
        TYPE_ZSET => {
            let (len, len_raw) = decode_length(reader)?;
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: Some(len_raw),
                orig_raw_string: None,
                encoding: SourceEncoding::SkipList,
            };
            observer.start_sorted_set(&key, len, header.expiry_unix_seconds, &obj_info);
            for _ in 0..len {
                let member = read_string(reader, true)?;
                let (score, score_raw) = read_ascii_score(reader)?;
                let mut raw = Vec::with_capacity(member.raw.len() + score_raw.len());
                raw.extend_from_slice(&member.raw);
                raw.extend_from_slice(&score_raw);
                let info = ElementInfo { orig_val: Bytes::from(raw) };
                observer.zadd(&key, score, member.value.as_deref().unwrap_or(&[]), &info);
            }
            observer.end_sorted_set(&key);
            Ok(LogicalType::SortedSet)
        }
        TYPE_HASH => {
            let (len, len_raw) = decode_length(reader)?;
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: Some(len_raw),
                orig_raw_string: None,
                encoding: SourceEncoding::HashTable,
            };
            observer.start_hash(&key, len, header.expiry_unix_seconds, &obj_info);
            for _ in 0..len {
                // The real_field ignore flag only applies to hash-ziplist decoding;
                // a plain hash's field is always materialized.
                let field = read_string(reader, true)?;
                let value = read_string(reader, !ignore.real_value)?;
                if ignore.real_value {
                    debug!("hash value elided by real_value ignore flag for key {:?}", String::from_utf8_lossy(&key));
                }
                let info = FieldInfo { orig_field: field.raw, orig_value: value.raw };
                observer.hset(
                    &key,
                    field.value.as_deref().unwrap_or(&[]),
                    value.value.as_deref().unwrap_or(&[]),
                    &info,
                );
            }
            observer.end_hash(&key);
            Ok(LogicalType::Hash)
        }
        TYPE_ZIPMAP => {
            let arena = read_string(reader, true)?;
            let buf = arena.value.as_deref().unwrap_or(&[]);
            let entries: Vec<_> = zipmap::parse(buf)?.collect::<Result<_>>()?;
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: None,
                orig_raw_string: Some(arena.raw),
                encoding: SourceEncoding::Zipmap,
            };
            observer.start_hash(&key, entries.len(), header.expiry_unix_seconds, &obj_info);
            for entry in entries {
                let info = FieldInfo { orig_field: entry.field.clone(), orig_value: entry.value.clone() };
                // real_field only applies to hash-ziplist decoding; zipmap fields
                // are always materialized, matching the plain-hash branch above.
                let field = &entry.field[..];
                let value = if ignore.real_value {
                    debug!("hash value elided by real_value ignore flag for key {:?}", String::from_utf8_lossy(&key));
                    &[][..]
                } else {
                    &entry.value[..]
                };
                observer.hset(&key, field, value, &info);
            }
            observer.end_hash(&key);
            Ok(LogicalType::Hash)
        }
        TYPE_ZIPLIST => {
            let arena = read_string(reader, true)?;
            let buf = arena.value.as_deref().unwrap_or(&[]);
            let (zl_header, iter) = ziplist::parse(buf)?;
            let entries: Vec<_> = iter.collect::<Result<_>>()?;
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: None,
                orig_raw_string: Some(arena.raw),
                encoding: SourceEncoding::Ziplist,
            };
            observer.start_list(&key, zl_header.num_entries as usize, header.expiry_unix_seconds, &obj_info);
            for entry in entries {
                let bytes = entry.into_bytes();
                let info = ElementInfo { orig_val: bytes.clone() };
                observer.rpush(&key, &bytes, &info);
            }
            observer.end_list(&key);
            Ok(LogicalType::List)
        }
        TYPE_INTSET => {
            let arena = read_string(reader, true)?;
            let buf = arena.value.as_deref().unwrap_or(&[]);
            let members = intset::decode(buf)?;
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: None,
                orig_raw_string: Some(arena.raw),
                encoding: SourceEncoding::Intset,
            };
            observer.start_set(&key, members.len(), header.expiry_unix_seconds, &obj_info);
            for member in members {
                let text = member.to_string().into_bytes();
                let info = ElementInfo { orig_val: Bytes::from(text.clone()) };
                observer.sadd(&key, &text, &info);
            }
            observer.end_set(&key);
            Ok(LogicalType::Set)
        }
        TYPE_ZSET_ZIPLIST => {
            let arena = read_string(reader, true)?;
            let buf = arena.value.as_deref().unwrap_or(&[]);
            let (zl_header, iter) = ziplist::parse(buf)?;
            let entries: Vec<_> = iter.collect::<Result<_>>()?;
            if entries.len() % 2 != 0 {
                return Err(ParseError::new(
                    ErrorKind::CorruptZiplist,
                    "sorted-set ziplist has an odd entry count",
                ));
            }
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: None,
                orig_raw_string: Some(arena.raw),
                encoding: SourceEncoding::Ziplist,
            };
            observer.start_sorted_set(
                &key,
                zl_header.num_entries as usize / 2,
                header.expiry_unix_seconds,
                &obj_info,
            );
            let mut pairs = entries.into_iter();
            while let (Some(member), Some(score_val)) = (pairs.next(), pairs.next()) {
                let member_bytes = member.into_bytes();
                let score_bytes = score_val.into_bytes();
                let score: f64 = std::str::from_utf8(&score_bytes)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| ParseError::new(ErrorKind::BadScore, "unparseable sorted-set score"))?;
                let info = ElementInfo { orig_val: score_bytes };
                observer.zadd(&key, score, &member_bytes, &info);
            }
            observer.end_sorted_set(&key);
            Ok(LogicalType::SortedSet)
        }
        TYPE_HASH_ZIPLIST => {
            let arena = read_string(reader, true)?;
            let buf = arena.value.as_deref().unwrap_or(&[]);
            let (zl_header, iter) = ziplist::parse(buf)?;
            let entries: Vec<_> = iter.collect::<Result<_>>()?;
            if entries.len() % 2 != 0 {
                return Err(ParseError::new(
                    ErrorKind::CorruptZiplist,
                    "hash ziplist has an odd entry count",
                ));
            }
            let obj_info = ObjectInfo {
                orig_expiry: header.expiry_raw,
                orig_data_type: header.type_raw,
                orig_key: header.key_raw.clone(),
                orig_length: None,
                orig_raw_string: Some(arena.raw),
                encoding: SourceEncoding::Ziplist,
            };
            observer.start_hash(&key, zl_header.num_entries as usize / 2, header.expiry_unix_seconds, &obj_info);
            let mut pairs = entries.into_iter();
            while let (Some(field), Some(value)) = (pairs.next(), pairs.next()) {
                let field_bytes = field.into_bytes();
                let value_bytes = value.into_bytes();
                let info = FieldInfo { orig_field: field_bytes.clone(), orig_value: value_bytes.clone() };
                if ignore.real_field || ignore.real_value {
                    debug!(
                        "hash-ziplist field/value elided by ignore flags for key {:?}",
                        String::from_utf8_lossy(&key)
                    );
                }
                let field_out = if ignore.real_field { &[][..] } else { &field_bytes[..] };
                let value_out = if ignore.real_value { &[][..] } else { &value_bytes[..] };
                observer.hset(&key, field_out, value_out, &info);
            }
            observer.end_hash(&key);
            Ok(LogicalType::Hash)
        }
        other => Err(ParseError::new(
            ErrorKind::UnknownObjectType,
            format!("unrecognized object type opcode {other}"),
        )),
    }
}

fn read_ascii_score<R: Read>(reader: &mut ByteReader<R>) -> Result<(f64, Bytes)> {
    let (len, len_raw) = reader.read_u8()?;
    let body = reader.read_exact(len as usize)?;
    let mut raw = Vec::with_capacity(len_raw.len() + body.len());
    raw.extend_from_slice(&len_raw);
    raw.extend_from_slice(&body);
    let score: f64 = std::str::from_utf8(&body)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::new(ErrorKind::BadScore, "unparseable sorted-set score"))?;
    Ok((score, Bytes::from(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{DbInfo, EndDbInfo, ScalarInfo};
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        sets: Vec<(Vec<u8>, Vec<u8>)>,
        list_items: Vec<Vec<u8>>,
        hash_items: Vec<(Vec<u8>, Vec<u8>)>,
    }

    impl Observer for Recorder {
        fn set(&mut self, key: &[u8], value: &[u8], _expiry: Option<u64>, _info: &ScalarInfo) {
            self.sets.push((key.to_vec(), value.to_vec()));
        }
        fn rpush(&mut self, _key: &[u8], value: &[u8], _info: &ElementInfo) {
            self.list_items.push(value.to_vec());
        }
        fn hset(&mut self, _key: &[u8], field: &[u8], value: &[u8], _info: &FieldInfo) {
            self.hash_items.push((field.to_vec(), value.to_vec()));
        }
        fn start_database(&mut self, _db_number: u32, _info: &DbInfo) {}
        fn end_database(&mut self, _db_number: u32, _info: &EndDbInfo) {}
    }

    fn header(type_opcode: u8, key: &str) -> ObjectHeader {
        ObjectHeader {
            type_opcode,
            type_raw: Bytes::from(vec![type_opcode]),
            key: Bytes::from(key.as_bytes().to_vec()),
            key_raw: Bytes::from(key.as_bytes().to_vec()),
            expiry_unix_seconds: None,
            expiry_raw: None,
        }
    }

    #[test]
    fn dispatch_plain_string() {
        let mut r = ByteReader::new(Cursor::new(vec![0x03, b'b', b'a', b'r']));
        let mut obs = Recorder::default();
        let t = dispatch(&mut r, header(TYPE_STRING, "foo"), IgnoreFlags::default(), &mut obs).unwrap();
        assert_eq!(t, LogicalType::String);
        assert_eq!(obs.sets, vec![(b"foo".to_vec(), b"bar".to_vec())]);
    }

    #[test]
    fn dispatch_plain_list() {
        let mut r = ByteReader::new(Cursor::new(vec![0x02, 0x01, b'a', 0x01, b'b']));
        let mut obs = Recorder::default();
        let t = dispatch(&mut r, header(TYPE_LIST, "l"), IgnoreFlags::default(), &mut obs).unwrap();
        assert_eq!(t, LogicalType::List);
        assert_eq!(obs.list_items, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn dispatch_intset_as_set() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&4u32.to_le_bytes()); // width 4
        buf.extend_from_slice(&1u32.to_le_bytes()); // count 1
        buf.extend_from_slice(&7i32.to_le_bytes());
        let mut input = vec![buf.len() as u8];
        input.extend_from_slice(&buf);
        let mut r = ByteReader::new(Cursor::new(input));
        let mut obs = Recorder::default();
        let t = dispatch(&mut r, header(TYPE_INTSET, "s"), IgnoreFlags::default(), &mut obs).unwrap();
        assert_eq!(t, LogicalType::Set);
    }

    #[test]
    fn unknown_type_opcode_errors() {
        let mut r = ByteReader::new(Cursor::new(vec![]));
        let mut obs = Recorder::default();
        let err = dispatch(&mut r, header(99, "k"), IgnoreFlags::default(), &mut obs).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownObjectType);
    }

    #[test]
    fn real_field_ignore_flag_has_no_effect_on_plain_hash() {
        // real_field only applies to hash-ziplist decoding; a plain hash's
        // field must always be materialized regardless of the flag.
        let mut r = ByteReader::new(Cursor::new(vec![0x01, 0x01, b'f', 0x01, b'v']));
        let mut obs = Recorder::default();
        let ignore = IgnoreFlags { real_value: false, real_field: true };
        dispatch(&mut r, header(TYPE_HASH, "h"), ignore, &mut obs).unwrap();
        assert_eq!(obs.hash_items, vec![(b"f".to_vec(), b"v".to_vec())]);
    }

    #[test]
    fn real_value_ignore_flag_elides_plain_hash_value() {
        let mut r = ByteReader::new(Cursor::new(vec![0x01, 0x01, b'f', 0x01, b'v']));
        let mut obs = Recorder::default();
        let ignore = IgnoreFlags { real_value: true, real_field: false };
        dispatch(&mut r, header(TYPE_HASH, "h"), ignore, &mut obs).unwrap();
        assert_eq!(obs.hash_items, vec![(b"f".to_vec(), Vec::new())]);
    }

    #[test]
    fn real_field_ignore_flag_elides_decoded_field_only_in_hash_ziplist() {
        let mut zl = vec![0u8; 10];
        zl[8..10].copy_from_slice(&2u16.to_le_bytes());
        zl.extend_from_slice(&[0x00, 0x01, b'f']); // prev_len, 1-byte string "f"
        zl.extend_from_slice(&[0x03, 0x01, b'v']); // prev_len, 1-byte string "v"
        zl.push(0xFF);
        let mut input = vec![zl.len() as u8];
        input.extend_from_slice(&zl);
        let mut r = ByteReader::new(Cursor::new(input));
        let mut obs = Recorder::default();
        let ignore = IgnoreFlags { real_value: false, real_field: true };
        dispatch(&mut r, header(TYPE_HASH_ZIPLIST, "h"), ignore, &mut obs).unwrap();
        assert_eq!(obs.hash_items, vec![(Vec::new(), b"v".to_vec())]);
    }
}
