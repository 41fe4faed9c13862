//! Per-identifier lookup results.

use std::collections::hash_map;
use std::collections::HashMap;

use serde_json::Value;

/// Marker stored (and printed) for a failed lookup.
pub const ERROR_MARKER: &str = "ERROR";

/// Decoded record, or an error marker with no further detail.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Record(Value),
    Error,
}

impl LookupResult {
    pub fn is_error(&self) -> bool {
        matches!(self, LookupResult::Error)
    }

    pub fn record(&self) -> Option<&Value> {
        match self {
            LookupResult::Record(v) => Some(v),
            LookupResult::Error => None,
        }
    }

    /// JSON view: the record itself, or the `"ERROR"` string.
    pub fn to_json(&self) -> Value {
        match self {
            LookupResult::Record(v) => v.clone(),
            LookupResult::Error => Value::String(ERROR_MARKER.to_string()),
        }
    }
}

/// Results of one round, keyed by identifier, plus the number of records
/// the remote returned without a usable self-identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultMap {
    entries: HashMap<String, LookupResult>,
    dropped: usize,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<&LookupResult> {
        self.entries.get(identifier)
    }

    pub fn contains_key(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, LookupResult> {
        self.entries.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, String, LookupResult> {
        self.entries.keys()
    }

    /// Number of entries holding the error marker.
    pub fn error_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_error()).count()
    }

    /// Records dropped in this round for lacking a self-identifier.
    pub fn dropped_records(&self) -> usize {
        self.dropped
    }

    pub fn insert(&mut self, identifier: impl Into<String>, result: LookupResult) {
        self.entries.insert(identifier.into(), result);
    }

    pub(crate) fn record_dropped(&mut self) {
        self.dropped += 1;
    }

    /// Fold another round into this one (used by callers that want a single
    /// map for the whole run).
    pub fn merge(&mut self, other: ResultMap) {
        self.dropped += other.dropped;
        self.entries.extend(other.entries);
    }

    pub fn into_entries(self) -> HashMap<String, LookupResult> {
        self.entries
    }
}

impl IntoIterator for ResultMap {
    type Item = (String, LookupResult);
    type IntoIter = hash_map::IntoIter<String, LookupResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultMap {
    type Item = (&'a String, &'a LookupResult);
    type IntoIter = hash_map::Iter<'a, String, LookupResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
