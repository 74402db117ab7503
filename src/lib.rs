//! A streaming parser for the Redis RDB snapshot binary format.
//!
//! The parser consumes an RDB byte stream sequentially and reports every
//! database, key, and element it discovers to an [`Observer`] implementation,
//! in file order, along with the raw byte spans that produced each event so
//! a downstream consumer can re-emit a byte-faithful copy of the original
//! file while selectively transforming logical values.
//!
//! ```no_run
//! use std::fs::File;
//! use rdb_stream::{Observer, Parser, FilterBuilder, IgnoreFlags};
//!
//! struct Counter(u64);
//! impl Observer for Counter {
//!     fn set(&mut self, _key: &[u8], _value: &[u8], _expiry: Option<u64>, _info: &rdb_stream::ScalarInfo) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let filter = FilterBuilder::new().build()?;
//! let parser = Parser::new(filter, IgnoreFlags::default());
//! let mut counter = Counter(0);
//! parser.parse(File::open("dump.rdb")?, &mut counter)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod arena;
mod byte_reader;
pub mod dispatch;
pub mod error;
pub mod filter;
mod length;
mod lzf;
pub mod observer;
mod parser;
mod string;

pub use error::{ErrorKind, ParseError, Result};
pub use filter::{Filter, FilterBuilder, IgnoreFlags, LogicalType};
pub use observer::{DbInfo, ElementInfo, EndDbInfo, FieldInfo, ObjectInfo, Observer, ScalarInfo, SourceEncoding};
pub use parser::Parser;
