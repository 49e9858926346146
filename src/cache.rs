//! Per-request cache of realized records, keyed by query identity.

use crate::query::CorrelationId;
use crate::types::RealizedRecord;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Maps each diverted query to the records realized for it.
///
/// An entry is written once, when the query is diverted, and only read
/// afterwards. There is no eviction: the cache lives as long as the request.
#[derive(Debug, Default)]
pub struct IdentityCache {
  entries: HashMap<CorrelationId, Vec<RealizedRecord>>,
}

impl IdentityCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Stores records for a query unless it already has an entry.
  ///
  /// Returns `false` (and leaves the existing entry alone) on a second insert.
  pub fn insert(&mut self, id: CorrelationId, records: Vec<RealizedRecord>) -> bool {
    match self.entries.entry(id) {
      Entry::Occupied(_) => false,
      Entry::Vacant(slot) => {
        slot.insert(records);
        true
      }
    }
  }

  pub fn get(&self, id: &CorrelationId) -> Option<&[RealizedRecord]> {
    self.entries.get(id).map(Vec::as_slice)
  }

  pub fn contains(&self, id: &CorrelationId) -> bool {
    self.entries.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
