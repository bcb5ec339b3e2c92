//! The weather cache
//!
//! Every lookup runs the same sequence under its key's lock:
//! check the store, serve or fetch, reconcile or fall back, write, release.
//! `get` and `get_async` only differ in how they wait for the lock and the
//! upstream; the decisions live in `lookup` and `settle`.

use crate::cache::freshness::{self, Freshness};
use crate::cache::lock::KeyLocks;
use crate::cache::reconcile::{reconcile, Reconciliation};
use crate::cache::settings::CacheSettings;
use crate::cache::store::{CacheEntry, CacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, CacheResult, FetchError};
use crate::fetch::{FileResponseLogger, Fetcher, OpenWeatherMapClient};
use crate::query::LocationQuery;
use crate::reading::{Observation, Reading};
use chrono::{DateTime, TimeDelta, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Outcome of checking the store under the lock
enum Lookup {
    Served(Reading),
    Refetch {
        checked_at: DateTime<Utc>,
        cached: Option<CacheEntry>,
    },
}

/// Single-flight, stale-tolerant cache in front of a `Fetcher`
pub struct WeatherCache {
    settings: CacheSettings,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    store: CacheStore,
    locks: KeyLocks<LocationQuery>,
}

impl WeatherCache {
    pub fn new(settings: CacheSettings, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            settings,
            fetcher,
            clock: Arc::new(SystemClock),
            store: CacheStore::new(),
            locks: KeyLocks::new(),
        }
    }

    /// Replace the wall clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build an OpenWeatherMap-backed cache from configuration
    pub fn from_config(config: &Config) -> CacheResult<Self> {
        let settings = CacheSettings::try_from(&config.cache)?;
        let api_key = config.api.api_key.clone().ok_or(CacheError::MissingApiKey)?;

        let mut client = OpenWeatherMapClient::new(api_key)?.with_base_url(&config.api.base_url)?;
        if let Some(dir) = config.response_log.active_dir() {
            client = client.with_response_log(Arc::new(FileResponseLogger::new(dir)));
        }

        Ok(Self::new(settings, Arc::new(client)))
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Rows in the store, including expired ones not yet pruned
    pub fn entry_count(&self) -> usize {
        self.store.len()
    }

    /// Keys currently locked or awaited
    pub fn active_lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Latest reading for `query`, blocking the current thread
    ///
    /// Never fails: upstream trouble yields a stale or failed reading.
    /// On a multi-thread tokio worker the wait runs under `block_in_place`.
    ///
    /// # Panics
    ///
    /// Panics when called from a current-thread tokio runtime, which has no
    /// spare thread to block; use `get_async` there.
    pub fn get(&self, query: &LocationQuery) -> Reading {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.get_blocking(query))
            }
            _ => self.get_blocking(query),
        }
    }

    fn get_blocking(&self, query: &LocationQuery) -> Reading {
        let _guard = self.locks.acquire(query);

        match self.lookup(query) {
            Lookup::Served(reading) => reading,
            Lookup::Refetch { checked_at, cached } => {
                let outcome = self
                    .fetcher
                    .fetch_blocking(query, self.settings.fetch_timeout());
                self.settle(query, checked_at, cached, outcome)
            }
        }
    }

    /// Latest reading for `query` without blocking the task
    ///
    /// The only error is `CacheError::Cancelled`, returned when `cancel`
    /// fires while waiting for the lock or the upstream. The store is never
    /// left half-written: reconciliation does not suspend.
    pub async fn get_async(
        &self,
        query: &LocationQuery,
        cancel: Option<&CancellationToken>,
    ) -> CacheResult<Reading> {
        let _guard = cancellable(cancel, self.locks.acquire_async(query)).await?;

        match self.lookup(query) {
            Lookup::Served(reading) => Ok(reading),
            Lookup::Refetch { checked_at, cached } => {
                let timeout = self.settings.fetch_timeout();
                let fetch = async {
                    tokio::time::timeout(timeout, self.fetcher.fetch(query, timeout))
                        .await
                        .unwrap_or(Err(FetchError::Timeout(timeout)))
                };
                let outcome = cancellable(cancel, fetch).await?;
                Ok(self.settle(query, checked_at, cached, outcome))
            }
        }
    }

    /// CacheChecked: serve a fresh entry or hand over to the fetch
    fn lookup(&self, query: &LocationQuery) -> Lookup {
        let now = self.clock.now();
        let cached = self.store.get(query, now);

        let verdict = freshness::assess(now, cached.as_ref(), self.settings.cache_period());
        match (verdict, cached) {
            (Freshness::ServeCachedFresh, Some(entry)) => {
                debug!("Cache hit for {}", query);
                Lookup::Served(entry.reading.served(true, false))
            }
            (_, cached) => {
                debug!(
                    "Fetching {} from {} (cached: {})",
                    query,
                    self.fetcher.name(),
                    cached.is_some()
                );
                Lookup::Refetch {
                    checked_at: now,
                    cached,
                }
            }
        }
    }

    /// Reconciled / FetchFailed: decide what becomes canonical and write it
    fn settle(
        &self,
        query: &LocationQuery,
        checked_at: DateTime<Utc>,
        cached: Option<CacheEntry>,
        outcome: Result<Observation, FetchError>,
    ) -> Reading {
        let observation = match outcome {
            Ok(observation) => observation,
            Err(err) => return self.fall_back(query, checked_at, cached.as_ref(), err),
        };

        let fetched = Reading::fetched(observation, self.clock.now());
        let resiliency = self.settings.resiliency_period();

        match reconcile(
            self.settings.mode(),
            cached.as_ref().map(|entry| &entry.reading),
            fetched,
        ) {
            Reconciliation::Adopt(reading) => {
                self.store
                    .set(query.clone(), reading.clone(), expiry(reading.fetched_at, resiliency));
                reading.served(false, true)
            }
            Reconciliation::KeepCached { reading, extend } => {
                debug!(
                    "Upstream regressed for {}; keeping reading measured at {} (extend: {})",
                    query, reading.measured_at, extend
                );
                if extend {
                    self.store
                        .set(query.clone(), reading.clone(), expiry(reading.fetched_at, resiliency));
                }
                reading.served(false, true)
            }
        }
    }

    fn fall_back(
        &self,
        query: &LocationQuery,
        checked_at: DateTime<Utc>,
        cached: Option<&CacheEntry>,
        err: FetchError,
    ) -> Reading {
        match freshness::fallback(checked_at, cached, self.settings.resiliency_period()) {
            Some(reading) => {
                warn!("Fetch for {} failed, serving cached reading: {}", query, err);
                reading.served(true, false)
            }
            None => {
                warn!("Fetch for {} failed: {}", query, err);
                Reading::failed(err.to_string(), self.clock.now(), true)
            }
        }
    }
}

/// End of the resiliency window, saturating at the end of representable time
fn expiry(fetched_at: DateTime<Utc>, resiliency: TimeDelta) -> DateTime<Utc> {
    fetched_at
        .checked_add_signed(resiliency)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Race `fut` against the cancellation token, if any
async fn cancellable<T>(
    cancel: Option<&CancellationToken>,
    fut: impl Future<Output = T>,
) -> CacheResult<T> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(CacheError::Cancelled),
            value = fut => Ok(value),
        },
        None => Ok(fut.await),
    }
}
