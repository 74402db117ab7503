//! Top-level stream driver (§4.G): magic/version verification, the opcode
//! loop, database tracking, and the filter gate.

use std::io::Read;

use bytes::Bytes;
use log::{debug, info};

use crate::byte_reader::ByteReader;
use crate::dispatch::{self, ObjectHeader};
use crate::error::{ErrorKind, ParseError, Result};
use crate::filter::{Filter, IgnoreFlags, LogicalType};
use crate::length::decode_length;
use crate::observer::{DbInfo, EndDbInfo, Observer};

const OPCODE_EXPIRETIME_MS: u8 = 0xFC;
const OPCODE_EXPIRETIME: u8 = 0xFD;
const OPCODE_SELECTDB: u8 = 0xFE;
const OPCODE_EOF: u8 = 0xFF;

const MIN_SUPPORTED_VERSION: u32 = 1;
const MAX_SUPPORTED_VERSION: u32 = 6;

/// Parses an RDB byte stream, driving `observer` with the events from §6.
pub struct Parser {
    filter: Filter,
    ignore: IgnoreFlags,
}

impl Parser {
    pub fn new(filter: Filter, ignore: IgnoreFlags) -> Self {
        Parser { filter, ignore }
    }

    /// Parse a complete RDB stream from `source`, reporting events to
    /// `observer`. Any error aborts the parse; `end_rdb` is only emitted on
    /// full success.
    pub fn parse<R: Read>(&self, source: R, observer: &mut dyn Observer) -> Result<()> {
        let mut reader = ByteReader::new(source);
        self.verify_header(&mut reader)?;
        observer.start_rdb();
        info!("start of RDB stream");

        let mut db_number: u32 = 0;
        let mut has_selected_db = false;
        let mut pending_expiry: Option<(u64, Bytes)> = None;

        loop {
            let (opcode, opcode_raw) = reader.read_u8()?;
            match opcode {
                OPCODE_EXPIRETIME_MS => {
                    let (ms, ms_raw) = reader.read_u64_le()?;
                    let mut raw = Vec::with_capacity(opcode_raw.len() + ms_raw.len());
                    raw.extend_from_slice(&opcode_raw);
                    raw.extend_from_slice(&ms_raw);
                    pending_expiry = Some((ms / 1000, Bytes::from(raw)));
                }
                OPCODE_EXPIRETIME => {
                    let (secs, secs_raw) = reader.read_u32_le()?;
                    let mut raw = Vec::with_capacity(opcode_raw.len() + secs_raw.len());
                    raw.extend_from_slice(&opcode_raw);
                    raw.extend_from_slice(&secs_raw);
                    pending_expiry = Some((secs as u64, Bytes::from(raw)));
                }
                OPCODE_SELECTDB => {
                    let (new_db_number, db_raw) = decode_length(&mut reader)?;
                    if has_selected_db {
                        observer.end_database(db_number, &EndDbInfo { orig_end_db: Bytes::new() });
                    }
                    db_number = new_db_number as u32;
                    info!("selecting database {db_number}");
                    let mut raw = Vec::with_capacity(opcode_raw.len() + db_raw.len());
                    raw.extend_from_slice(&opcode_raw);
                    raw.extend_from_slice(&db_raw);
                    observer.start_database(db_number, &DbInfo { orig_db_number: Bytes::from(raw) });
                    has_selected_db = true;
                    pending_expiry = None;
                }
                OPCODE_EOF => {
                    observer.end_database(db_number, &EndDbInfo { orig_end_db: opcode_raw });
                    observer.end_rdb();
                    info!("end of RDB stream");
                    return Ok(());
                }
                type_opcode => {
                    let expiry_raw = pending_expiry.as_ref().map(|(_, raw)| raw.clone());
                    let expiry_unix_seconds = pending_expiry.as_ref().map(|(secs, _)| *secs);
                    pending_expiry = None;

                    if !self.filter.matches_db(db_number) {
                        // Still must advance the cursor identically: decode
                        // the key and skip the payload without emitting.
                        self.skip_key_and_payload(&mut reader, type_opcode)?;
                        continue;
                    }

                    let key_str = crate::string::read_string(&mut reader, true)?;
                    let key = key_str.value.clone().unwrap_or_default();
                    let logical_type = logical_type_for_opcode(type_opcode)?;

                    if !self.filter.matches_key_and_type(&key, logical_type) {
                        debug!("key {:?} excluded by filter, skipping payload", String::from_utf8_lossy(&key));
                        skip_payload(&mut reader, type_opcode)?;
                        continue;
                    }

                    let header = ObjectHeader {
                        type_opcode,
                        type_raw: opcode_raw,
                        key,
                        key_raw: key_str.raw,
                        expiry_unix_seconds,
                        expiry_raw,
                    };
                    dispatch::dispatch(&mut reader, header, self.ignore, observer)?;
                }
            }
        }
    }

    fn verify_header<R: Read>(&self, reader: &mut ByteReader<R>) -> Result<()> {
        let magic = reader.read_exact(5)?;
        if &magic[..] != b"REDIS" {
            return Err(ParseError::new(ErrorKind::BadMagic, "file did not start with REDIS"));
        }
        let version_bytes = reader.read_exact(4)?;
        let version_str = std::str::from_utf8(&version_bytes)
            .map_err(|_| ParseError::new(ErrorKind::BadVersion, "version field was not ASCII"))?;
        let version: u32 = version_str
            .parse()
            .map_err(|_| ParseError::new(ErrorKind::BadVersion, "version field was not numeric"))?;
        if !(MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&version) {
            return Err(ParseError::new(ErrorKind::BadVersion, format!("unsupported version {version}")));
        }
        Ok(())
    }

    /// Advance past a key and its payload without decoding either, used
    /// when a `dbs` filter excludes the current database entirely.
    fn skip_key_and_payload<R: Read>(&self, reader: &mut ByteReader<R>, type_opcode: u8) -> Result<()> {
        crate::string::read_string(reader, false)?;
        skip_payload(reader, type_opcode)
    }
}

fn logical_type_for_opcode(opcode: u8) -> Result<LogicalType> {
    use dispatch::*;
    match opcode {
        TYPE_STRING => Ok(LogicalType::String),
        TYPE_LIST | TYPE_ZIPLIST => Ok(LogicalType::List),
        TYPE_SET | TYPE_INTSET => Ok(LogicalType::Set),
        TYPE_ZSET | TYPE_ZSET_ZIPLIST => Ok(LogicalType::SortedSet),
        TYPE_HASH | TYPE_ZIPMAP | TYPE_HASH_ZIPLIST => Ok(LogicalType::Hash),
        other => Err(ParseError::new(
            ErrorKind::UnknownObjectType,
            format!("unrecognized object type opcode {other}"),
        )),
    }
}

/// Skip a payload without materializing logical values or raw spans,
/// discarding a [`NullObserver`]'s output.
fn skip_payload<R: Read>(reader: &mut ByteReader<R>, type_opcode: u8) -> Result<()> {
    struct NullObserver;
    impl Observer for NullObserver {}
    let header = ObjectHeader {
        type_opcode,
        type_raw: Bytes::new(),
        key: Bytes::new(),
        key_raw: Bytes::new(),
        expiry_unix_seconds: None,
        expiry_raw: None,
    };
    dispatch::dispatch(reader, header, IgnoreFlags { real_value: true, real_field: true }, &mut NullObserver)?;
    Ok(())
}
