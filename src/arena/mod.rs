//! Decoders for the packed binary "arena" sub-formats embedded inside a
//! string value: intset, ziplist, and zipmap (§4.E).

pub mod intset;
pub mod zipmap;
pub mod ziplist;
