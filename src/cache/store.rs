//! In-memory reading store with lazy expiry

use crate::query::LocationQuery;
use crate::reading::Reading;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::trace;

/// The last known reading for a location
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub reading: Reading,

    /// After this instant the entry is no longer served, not even as a
    /// resiliency fallback
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Location -> entry map
///
/// Safe for concurrent use across keys. Writers for the same key are
/// serialized by the caller (the key lock).
#[derive(Default)]
pub struct CacheStore {
    entries: DashMap<LocationQuery, CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `query` if present and not expired at `now`
    ///
    /// An expired row is dropped on the way out.
    pub fn get(&self, query: &LocationQuery, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = self.entries.get(query).map(|e| e.value().clone())?;
        if entry.is_expired(now) {
            self.entries.remove_if(query, |_, e| e.is_expired(now));
            trace!("Pruned expired entry for {}", query);
            return None;
        }
        Some(entry)
    }

    pub fn set(&self, query: LocationQuery, reading: Reading, expires_at: DateTime<Utc>) {
        self.entries.insert(
            query,
            CacheEntry {
                reading,
                expires_at,
            },
        );
    }

    /// Physically present rows, including ones not yet pruned
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
