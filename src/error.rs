//! Error types for RDB parsing.
//!
//! Every fallible operation in this crate returns [`ParseError`]; there is no
//! second error type crossing a module boundary, so callers never need to
//! downcast or match on a trait object.

use thiserror::Error;

/// The distinct ways a parse can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file did not begin with the literal bytes `REDIS`.
    BadMagic,
    /// The 4-digit version field was not a supported version.
    BadVersion,
    /// The byte source ended before a required field could be read.
    Truncated,
    /// An object-type opcode did not match any known encoding.
    UnknownObjectType,
    /// A length-prefix special encoding discriminant was not recognized.
    UnknownStringEncoding,
    /// An LZF stream's reconstructed length did not match its declared length.
    CorruptLzf,
    /// A ziplist entry header or terminator did not match the expected format.
    CorruptZiplist,
    /// An intset declared an encoding width outside {2, 4, 8}.
    CorruptIntset,
    /// A sorted-set score could not be parsed as a finite double.
    BadScore,
    /// The caller supplied an invalid filter (e.g. an unparseable regex).
    InvalidFilter,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadMagic => "bad magic",
            ErrorKind::BadVersion => "bad version",
            ErrorKind::Truncated => "truncated input",
            ErrorKind::UnknownObjectType => "unknown object type",
            ErrorKind::UnknownStringEncoding => "unknown string encoding",
            ErrorKind::CorruptLzf => "corrupt LZF stream",
            ErrorKind::CorruptZiplist => "corrupt ziplist",
            ErrorKind::CorruptIntset => "corrupt intset",
            ErrorKind::BadScore => "bad sorted-set score",
            ErrorKind::InvalidFilter => "invalid filter",
        }
    }
}

/// A fatal parse error, carrying the key name when one was known at the
/// point of failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}", kind = .kind.as_str())]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
        }
    }

    pub fn with_key(kind: ErrorKind, key: &[u8], message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: format!("{} (key={:?})", message.into(), String::from_utf8_lossy(key)),
        }
    }

    pub fn truncated(what: &str) -> Self {
        ParseError::new(ErrorKind::Truncated, format!("could not read {what}"))
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
