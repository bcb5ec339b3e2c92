//! Freshness and resiliency decisions
//!
//! Pure functions of the current time and the cached entry.

use crate::cache::store::CacheEntry;
use crate::reading::Reading;
use chrono::{DateTime, TimeDelta, Utc};

/// What to do with a lookup once the cache has been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The cached reading is young enough; no upstream call
    ServeCachedFresh,
    /// Missing, failed or older than the cache period; fetch
    AttemptRefetch,
}

/// Decide whether the cached entry can be served as is
pub fn assess(now: DateTime<Utc>, entry: Option<&CacheEntry>, cache_period: TimeDelta) -> Freshness {
    match entry {
        Some(entry)
            if entry.reading.is_successful()
                && now - entry.reading.fetched_at <= cache_period =>
        {
            Freshness::ServeCachedFresh
        }
        _ => Freshness::AttemptRefetch,
    }
}

/// The reading to serve after a failed fetch, if the resiliency window allows
pub fn fallback(
    now: DateTime<Utc>,
    entry: Option<&CacheEntry>,
    resiliency_period: TimeDelta,
) -> Option<Reading> {
    entry
        .filter(|e| e.reading.is_successful())
        .filter(|e| now - e.reading.fetched_at <= resiliency_period)
        .map(|e| e.reading.clone())
}
