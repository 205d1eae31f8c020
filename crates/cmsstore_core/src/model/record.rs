//! Change-tracking field record.
//!
//! # Responsibility
//! - Hold the flat string field map backing every entity.
//! - Track which keys were written since hydration or the last persist.
//!
//! # Invariants
//! - `changed` is empty right after hydration and after `mark_as_not_dirty`.
//! - `set` always marks the key dirty, even when the value is unchanged,
//!   so a re-assigned field is forced onto the next partial update.
//! - A record is mutated through `&mut self` only; sharing one record across
//!   threads for writing is not supported.

use crate::model::entity::EntityKind;
use std::collections::{BTreeMap, BTreeSet};

/// String-keyed field map with dirty tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    data: BTreeMap<String, String>,
    changed: BTreeSet<String>,
}

impl Record {
    /// Creates an empty, clean record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clean record from data already present in the backend.
    pub fn hydrated(data: BTreeMap<String, String>) -> Self {
        Self {
            data,
            changed: BTreeSet::new(),
        }
    }

    /// Creates a clean record populated with every column default of `kind`.
    pub fn with_defaults(kind: EntityKind) -> Self {
        let mut record = Self::new();
        for column in kind.columns() {
            record.set(*column, kind.default_value(column));
        }
        record.mark_as_not_dirty();
        record
    }

    /// Returns the value for `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.data.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Stores `value` and marks `key` dirty.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.changed.insert(key.clone());
        self.data.insert(key, value.into());
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    /// Returns only the dirty keys with their current values.
    pub fn data_changed(&self) -> BTreeMap<String, String> {
        self.changed
            .iter()
            .map(|key| (key.clone(), self.get(key).to_string()))
            .collect()
    }

    pub fn changed_keys(&self) -> &BTreeSet<String> {
        &self.changed
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Clears the dirty set without touching values.
    pub fn mark_as_not_dirty(&mut self) {
        self.changed.clear();
    }

    /// Replaces the baseline with `existing` and clears the dirty set.
    pub fn hydrate(&mut self, existing: BTreeMap<String, String>) {
        self.data = existing;
        self.changed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use crate::model::entity::EntityKind;
    use std::collections::BTreeMap;

    fn sample() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("id".to_string(), "p1".to_string()),
            ("title".to_string(), "Home".to_string()),
        ])
    }

    #[test]
    fn get_returns_empty_string_for_missing_key() {
        assert_eq!(Record::new().get("nope"), "");
    }

    #[test]
    fn hydrated_record_is_clean_but_readable() {
        let record = Record::hydrated(sample());
        assert_eq!(record.get("title"), "Home");
        assert!(record.data_changed().is_empty());
        assert!(!record.is_dirty());
    }

    #[test]
    fn set_marks_dirty_even_for_identical_value() {
        let mut record = Record::hydrated(sample());
        record.set("title", "Home");

        let changed = record.data_changed();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed.get("title").map(String::as_str), Some("Home"));
    }

    #[test]
    fn mark_as_not_dirty_keeps_values() {
        let mut record = Record::new();
        record.set("name", "Main");
        record.mark_as_not_dirty();
        record.mark_as_not_dirty();

        assert!(record.data_changed().is_empty());
        assert_eq!(record.get("name"), "Main");
    }

    #[test]
    fn hydrate_replaces_baseline_and_clears_dirty_set() {
        let mut record = Record::new();
        record.set("stale", "x");
        record.hydrate(sample());

        assert!(!record.contains("stale"));
        assert!(!record.is_dirty());
        assert_eq!(record.data().len(), 2);
    }

    #[test]
    fn defaults_cover_every_column_and_start_clean() {
        let record = Record::with_defaults(EntityKind::MenuItem);
        for column in EntityKind::MenuItem.columns() {
            assert!(record.contains(column), "missing default for {column}");
        }
        assert!(!record.is_dirty());
        assert_eq!(record.get("sequence"), "0");
    }
}
