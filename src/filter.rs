//! Filter / ignore policy (§4.H): which databases, keys, and logical types
//! the parser fully decodes, and whether hash fields/values are elided to
//! raw spans only.

use std::collections::HashSet;

use log::warn;
use regex::Regex;

use crate::error::{ErrorKind, ParseError, Result};

/// The logical type names a `types` filter axis matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    String,
    List,
    Set,
    SortedSet,
    Hash,
}

/// Which databases, keys, and types a parse should fully decode. A missing
/// axis (`None`) matches everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    dbs: Option<HashSet<u32>>,
    keys: Option<Regex>,
    types: Option<HashSet<LogicalType>>,
}

impl Filter {
    pub fn matches_db(&self, db: u32) -> bool {
        self.dbs.as_ref().map_or(true, |dbs| dbs.contains(&db))
    }

    pub fn matches_key_and_type(&self, key: &[u8], logical_type: LogicalType) -> bool {
        let key_ok = self
            .keys
            .as_ref()
            .map_or(true, |re| re.is_match(&String::from_utf8_lossy(key)));
        let type_ok = self.types.as_ref().map_or(true, |types| types.contains(&logical_type));
        key_ok && type_ok
    }
}

/// Whether the decoded logical value, not just its raw span, should be
/// materialized for hash fields and values. Both default to `false`: the
/// source material this crate is modeled on defaults `real_field` to `true`
/// by omission, which appears to be unintentional since its sibling flag
/// defaults to `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreFlags {
    pub real_value: bool,
    pub real_field: bool,
}

/// Validated builder for [`Filter`].
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    dbs: Option<HashSet<u32>>,
    keys: Option<String>,
    types: Option<HashSet<LogicalType>>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        FilterBuilder::default()
    }

    pub fn dbs(mut self, dbs: impl IntoIterator<Item = u32>) -> Self {
        self.dbs = Some(dbs.into_iter().collect());
        self
    }

    pub fn keys(mut self, pattern: impl Into<String>) -> Self {
        self.keys = Some(pattern.into());
        self
    }

    pub fn types(mut self, types: impl IntoIterator<Item = LogicalType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<Filter> {
        let keys = match self.keys {
            Some(pattern) => Some(
                Regex::new(&pattern)
                    .map_err(|e| ParseError::new(ErrorKind::InvalidFilter, format!("bad key regex: {e}")))?,
            ),
            None => None,
        };
        // Most RDB files never issue a SELECTDB opcode at all, in which case
        // every object is parsed as belonging to db 0; a dbs filter that
        // excludes db 0 will silently never match such a file.
        if let Some(dbs) = &self.dbs {
            if !dbs.contains(&0) {
                warn!("dbs filter {dbs:?} excludes database 0, which is where objects land when a file never issues SELECTDB");
            }
        }
        Ok(Filter { dbs: self.dbs, keys, types: self.types })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let f = FilterBuilder::new().build().unwrap();
        assert!(f.matches_db(0));
        assert!(f.matches_db(7));
        assert!(f.matches_key_and_type(b"anything", LogicalType::Hash));
    }

    #[test]
    fn db_filter_restricts_to_listed_dbs() {
        let f = FilterBuilder::new().dbs([0, 2]).build().unwrap();
        assert!(f.matches_db(0));
        assert!(!f.matches_db(1));
    }

    #[test]
    fn key_regex_filters_by_pattern() {
        let f = FilterBuilder::new().keys("^user:").build().unwrap();
        assert!(f.matches_key_and_type(b"user:1", LogicalType::String));
        assert!(!f.matches_key_and_type(b"session:1", LogicalType::String));
    }

    #[test]
    fn type_filter_restricts_logical_types() {
        let f = FilterBuilder::new().types([LogicalType::Hash]).build().unwrap();
        assert!(f.matches_key_and_type(b"k", LogicalType::Hash));
        assert!(!f.matches_key_and_type(b"k", LogicalType::String));
    }

    #[test]
    fn invalid_regex_fails_at_build_time() {
        let err = FilterBuilder::new().keys("(").build().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFilter);
    }

    #[test]
    fn ignore_flags_default_to_false() {
        let flags = IgnoreFlags::default();
        assert!(!flags.real_value);
        assert!(!flags.real_field);
    }
}
