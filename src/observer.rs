//! The SAX-style event contract the parser drives (§6, §9).
//!
//! [`Observer`] is a capability trait with a no-op default for every method,
//! so a caller overrides only the events it cares about. Every event also
//! carries an `info` bag with the raw byte spans that produced it, so a
//! downstream observer can re-emit a byte-faithful copy of the file while
//! selectively transforming logical values.

use bytes::Bytes;

/// Which on-disk encoding produced an object's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    String,
    LinkedList,
    HashTable,
    SkipList,
    Intset,
    Ziplist,
    Zipmap,
}

/// Raw spans for the database-selection opcode.
#[derive(Debug, Clone)]
pub struct DbInfo {
    pub orig_db_number: Bytes,
}

/// Raw spans shared by every keyed object's start event.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Raw bytes of the expire opcode + timestamp, if this key has one.
    pub orig_expiry: Option<Bytes>,
    /// Raw byte of the object-type opcode.
    pub orig_data_type: Bytes,
    /// Raw bytes of the key's length-prefixed string.
    pub orig_key: Bytes,
    /// Raw bytes of the length/cardinality prefix, for plain encodings.
    pub orig_length: Option<Bytes>,
    /// Raw bytes of the whole packed arena string, for packed encodings
    /// (ziplist, zipmap, intset).
    pub orig_raw_string: Option<Bytes>,
    pub encoding: SourceEncoding,
}

/// Raw spans for a single scalar `set` event (string keys have no
/// element-level events of their own).
#[derive(Debug, Clone)]
pub struct ScalarInfo {
    pub orig_expiry: Option<Bytes>,
    pub orig_data_type: Bytes,
    pub orig_key: Bytes,
    pub orig_val: Bytes,
}

/// Raw spans for one element within a list/set/sorted-set.
#[derive(Debug, Clone)]
pub struct ElementInfo {
    pub orig_val: Bytes,
}

/// Raw spans for one hash field/value pair.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub orig_field: Bytes,
    pub orig_value: Bytes,
}

/// Raw spans for the end-of-database marker.
#[derive(Debug, Clone)]
pub struct EndDbInfo {
    pub orig_end_db: Bytes,
}

/// The SAX-style callback contract. Every method defaults to a no-op so
/// implementors override only the events they need.
pub trait Observer {
    fn start_rdb(&mut self) {}

    fn start_database(&mut self, _db_number: u32, _info: &DbInfo) {}

    fn set(&mut self, _key: &[u8], _value: &[u8], _expiry_unix_seconds: Option<u64>, _info: &ScalarInfo) {}

    fn start_list(&mut self, _key: &[u8], _length: usize, _expiry_unix_seconds: Option<u64>, _info: &ObjectInfo) {}
    fn rpush(&mut self, _key: &[u8], _value: &[u8], _info: &ElementInfo) {}
    fn end_list(&mut self, _key: &[u8]) {}

    fn start_set(&mut self, _key: &[u8], _cardinality: usize, _expiry_unix_seconds: Option<u64>, _info: &ObjectInfo) {}
    fn sadd(&mut self, _key: &[u8], _member: &[u8], _info: &ElementInfo) {}
    fn end_set(&mut self, _key: &[u8]) {}

    fn start_sorted_set(&mut self, _key: &[u8], _length: usize, _expiry_unix_seconds: Option<u64>, _info: &ObjectInfo) {}
    fn zadd(&mut self, _key: &[u8], _score: f64, _member: &[u8], _info: &ElementInfo) {}
    fn end_sorted_set(&mut self, _key: &[u8]) {}

    fn start_hash(&mut self, _key: &[u8], _length: usize, _expiry_unix_seconds: Option<u64>, _info: &ObjectInfo) {}
    fn hset(&mut self, _key: &[u8], _field: &[u8], _value: &[u8], _info: &FieldInfo) {}
    fn end_hash(&mut self, _key: &[u8]) {}

    fn end_database(&mut self, _db_number: u32, _info: &EndDbInfo) {}

    fn end_rdb(&mut self) {}
}
