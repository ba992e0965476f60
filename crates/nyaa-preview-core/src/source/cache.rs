//! Per-source cache of catalog lookups
//!
//! One [`CacheRecord`] per normalized video id, inserted on first lookup and
//! kept for the whole session. Records are never evicted: the number of rows
//! a user hovers in one session is small.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::fetcher::PendingFetch;
use crate::types::{CatalogDocument, RemoteResponse};

use super::lock;

/// Cached state of one catalog lookup
#[derive(Debug)]
pub struct CacheRecord {
    pub(crate) normalized_id: String,
    pub(crate) source_url: String,
    pub(crate) raw_document: Option<CatalogDocument>,
    pub(crate) image_url: Option<String>,
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) pending_request: Option<PendingFetch>,
    pub(crate) last_response: Option<Arc<RemoteResponse>>,
    pub(crate) fulfilled: bool,
}

impl CacheRecord {
    pub(crate) fn new(normalized_id: &str, source_url: &str) -> Self {
        Self {
            normalized_id: normalized_id.to_string(),
            source_url: source_url.to_string(),
            raw_document: None,
            image_url: None,
            tags: None,
            pending_request: None,
            last_response: None,
            fulfilled: false,
        }
    }

    pub fn normalized_id(&self) -> &str {
        &self.normalized_id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled
    }

    pub fn is_pending(&self) -> bool {
        self.pending_request.is_some()
    }

    pub fn last_response(&self) -> Option<&RemoteResponse> {
        self.last_response.as_deref()
    }

    /// Snapshot of a fulfilled record.
    pub(crate) fn loaded(&self) -> Option<LoadedRecord> {
        if !self.fulfilled {
            return None;
        }
        self.raw_document.as_ref().map(|document| LoadedRecord {
            normalized_id: self.normalized_id.clone(),
            source_url: self.source_url.clone(),
            document: document.clone(),
        })
    }

    /// Store a successful response. A record that is already fulfilled keeps
    /// its first document and memoized derivations.
    pub(crate) fn fulfil(&mut self, response: Arc<RemoteResponse>) -> LoadedRecord {
        if let Some(loaded) = self.loaded() {
            return loaded;
        }

        let document = CatalogDocument::from_response(&response);
        self.raw_document = Some(document.clone());
        self.last_response = Some(response);
        self.fulfilled = true;

        LoadedRecord {
            normalized_id: self.normalized_id.clone(),
            source_url: self.source_url.clone(),
            document,
        }
    }

    /// Drop the pending slot if it still holds the fetch with `fetch_id`.
    pub(crate) fn clear_pending(&mut self, fetch_id: u64) -> bool {
        match &self.pending_request {
            Some(pending) if pending.id() == fetch_id => {
                self.pending_request = None;
                true
            }
            _ => false,
        }
    }
}

/// A fulfilled record, as handed back by `load_data`
#[derive(Debug, Clone)]
pub struct LoadedRecord {
    pub normalized_id: String,
    pub source_url: String,
    pub document: CatalogDocument,
}

/// Normalized id → record map owned by one data source
#[derive(Debug, Default)]
pub struct SourceCache {
    records: Mutex<HashMap<String, CacheRecord>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn records(&self) -> MutexGuard<'_, HashMap<String, CacheRecord>> {
        lock(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn contains(&self, normalized_id: &str) -> bool {
        self.records().contains_key(normalized_id)
    }

    pub fn is_fulfilled(&self, normalized_id: &str) -> bool {
        self.records()
            .get(normalized_id)
            .is_some_and(CacheRecord::is_fulfilled)
    }

    pub fn is_pending(&self, normalized_id: &str) -> bool {
        self.records()
            .get(normalized_id)
            .is_some_and(CacheRecord::is_pending)
    }
}
