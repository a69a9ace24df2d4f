//! Per-source indexing by name key
//!
//! Indexes borrow the flattened records of one run and are rebuilt from
//! scratch every time; nothing here outlives a merge.

use std::collections::HashMap;

use crate::models::{FlatRecord, NameKey, Source};
use crate::normalize::normalize;
use crate::resolve::display_text;

/// Representative and full indexes over one source's records
#[derive(Debug, Default)]
pub struct SourceIndex<'a> {
    /// Last record seen per key
    representative: HashMap<NameKey, &'a FlatRecord>,
    /// Every record per key, in input order
    multi: HashMap<NameKey, Vec<&'a FlatRecord>>,
    /// Records whose name field produced no key
    skipped: usize,
}

impl<'a> SourceIndex<'a> {
    /// Index records under the source's designated name field and strategy
    pub fn build(source: Source, records: &'a [FlatRecord]) -> Self {
        let mut index = SourceIndex::default();

        for record in records {
            let key = record
                .get(source.name_field())
                .and_then(display_text)
                .and_then(|raw| normalize(source.key_strategy(), &raw));

            match key {
                Some(key) => {
                    index.representative.insert(key.clone(), record);
                    index.multi.entry(key).or_default().push(record);
                }
                None => index.skipped += 1,
            }
        }

        index
    }

    pub fn representative(&self, key: &NameKey) -> Option<&'a FlatRecord> {
        self.representative.get(key).copied()
    }

    /// All records for a key; empty when the source does not report it
    pub fn instances(&self, key: &NameKey) -> &[&'a FlatRecord] {
        self.multi.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NameKey> {
        self.multi.keys()
    }

    pub fn key_count(&self) -> usize {
        self.multi.len()
    }

    /// Number of records that were indexed under some key
    pub fn indexed(&self) -> usize {
        self.multi.values().map(Vec::len).sum()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
