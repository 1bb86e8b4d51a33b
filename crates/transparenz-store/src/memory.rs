//! In-memory document store

use crate::StoreError;
use std::collections::BTreeMap;
use transparenz_domain::traits::{DocumentStore, RecordFilter};
use transparenz_domain::{ExtractedRecord, RecordId};

/// In-memory implementation of `DocumentStore`
///
/// Keeps records in a `BTreeMap` so queries return them in id
/// (chronological) order. Intended for tests and short-lived tooling;
/// callers that share a store across tasks wrap it in `Arc<Mutex<_>>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, ExtractedRecord>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    type Error = StoreError;

    fn put(&mut self, record: ExtractedRecord) -> Result<RecordId, Self::Error> {
        if self.records.contains_key(&record.id) {
            return Err(StoreError::Duplicate);
        }
        let id = record.id;
        self.records.insert(id, record);
        Ok(id)
    }

    fn get(&self, id: RecordId) -> Result<Option<ExtractedRecord>, Self::Error> {
        Ok(self.records.get(&id).cloned())
    }

    fn query(&self, filter: &RecordFilter) -> Result<Vec<ExtractedRecord>, Self::Error> {
        let needle = filter.text_match.as_ref().map(|t| t.to_lowercase());

        let mut results: Vec<ExtractedRecord> = self
            .records
            .values()
            .filter(|r| filter.category.map_or(true, |c| r.category == c))
            .filter(|r| filter.year.map_or(true, |y| r.year == Some(y)))
            .filter(|r| {
                needle
                    .as_ref()
                    .map_or(true, |n| r.text.to_lowercase().contains(n.as_str()))
            })
            .cloned()
            .collect();

        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }

        Ok(results)
    }
}
