//! Cache coordination engine
//!
//! Answers "latest reading for this location" with at most one upstream
//! request in flight per location, a hard freshness window and a softer
//! resiliency window for riding out upstream outages.
//!
//! # Lookup states
//!
//! | Entry | Age vs periods | Fetch | Result | from_cache | api_request |
//! |-------|----------------|-------|--------|------------|-------------|
//! | fresh | <= cache | - | cached | true | false |
//! | none / stale | > cache | ok, newer | fetched, stored | false | true |
//! | stale | > cache | ok, older | per `ReconciliationMode` | false | true |
//! | stale | <= resiliency | failed | cached | true | false |
//! | none / stale | > resiliency | failed | failed reading | false | true |
//!
//! Expired entries are not swept; they disappear on the next read.

pub mod freshness;
pub mod lock;
mod orchestrator;
pub mod reconcile;
pub mod settings;
pub mod store;

pub use lock::{KeyGuard, KeyLocks};
pub use orchestrator::WeatherCache;
pub use reconcile::ReconciliationMode;
pub use settings::{CacheSettings, CacheSettingsBuilder};
pub use store::{CacheEntry, CacheStore};
