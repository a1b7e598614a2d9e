//! De-duplicating, insertion-ordered record accumulator

use crate::records::Record;
use std::collections::HashSet;

/// Counts produced by one [`ResultSet::merge`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records appended to the set
    pub added: usize,

    /// Records discarded because their key was already present
    pub duplicates: usize,

    /// Records discarded because they carried no usable key
    pub keyless: usize,
}

impl MergeStats {
    /// Total records offered to the merge
    pub fn offered(&self) -> usize {
        self.added + self.duplicates + self.keyless
    }
}

/// Ordered collection of records, unique by dedup key
///
/// Insertion order is first-seen order across every batch merged. The set
/// only grows; `merge` and `absorb` are the only ways to add records.
#[derive(Debug, Clone)]
pub struct ResultSet {
    key_field: String,
    columns: Vec<String>,
    records: Vec<Record>,
    seen: HashSet<String>,
}

impl ResultSet {
    /// Creates an empty set keyed on `key_field` with the given output columns
    pub fn new(key_field: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            key_field: key_field.into(),
            columns,
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Merges a batch of records
    ///
    /// For each record: a missing or blank key discards it, a key already in
    /// the set discards it (first-seen wins), anything else is appended.
    ///
    /// # Arguments
    ///
    /// * `batch` - Records from one page, in page order
    ///
    /// # Returns
    ///
    /// Counts of added, duplicate and keyless records
    pub fn merge<I>(&mut self, batch: I) -> MergeStats
    where
        I: IntoIterator<Item = Record>,
    {
        let mut stats = MergeStats::default();

        for record in batch {
            let key = match record.key(&self.key_field) {
                Some(k) => k.to_string(),
                None => {
                    stats.keyless += 1;
                    continue;
                }
            };

            if self.seen.insert(key) {
                self.records.push(record);
                stats.added += 1;
            } else {
                stats.duplicates += 1;
            }
        }

        stats
    }

    /// Merges every record of another set, in its order, as one batch
    pub fn absorb(&mut self, other: ResultSet) -> MergeStats {
        self.merge(other.records)
    }

    /// Returns true if a record with this key has been merged
    pub fn contains_key(&self, key: &str) -> bool {
        self.seen.contains(key.trim())
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Output columns, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the set, returning its records
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
