//! Validated cache settings

use crate::cache::reconcile::ReconciliationMode;
use crate::config::schema::CacheConfig;
use crate::error::{CacheError, CacheResult};
use chrono::TimeDelta;
use std::time::Duration;

/// Default soft TTL: 5 minutes
pub const DEFAULT_RESILIENCY_PERIOD: Duration = Duration::from_millis(300_000);

/// Default upstream request timeout: 5 seconds
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Upper bound for either period: 10 years
pub const MAX_PERIOD: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Immutable per-cache settings
///
/// Only constructible through `CacheSettings::builder`, which enforces
/// positive periods, `resiliency_period >= cache_period` and
/// `resiliency_period <= MAX_PERIOD`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    cache_period: TimeDelta,
    resiliency_period: TimeDelta,
    mode: ReconciliationMode,
    fetch_timeout: Duration,
}

impl CacheSettings {
    pub fn builder(cache_period: Duration) -> CacheSettingsBuilder {
        CacheSettingsBuilder {
            cache_period,
            resiliency_period: DEFAULT_RESILIENCY_PERIOD,
            mode: ReconciliationMode::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Hard TTL: younger entries are served without touching the upstream
    pub fn cache_period(&self) -> TimeDelta {
        self.cache_period
    }

    /// Soft TTL: entries this young are served when the upstream fails
    pub fn resiliency_period(&self) -> TimeDelta {
        self.resiliency_period
    }

    pub fn mode(&self) -> ReconciliationMode {
        self.mode
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
}

/// Builder for `CacheSettings`
#[derive(Debug, Clone)]
pub struct CacheSettingsBuilder {
    cache_period: Duration,
    resiliency_period: Duration,
    mode: ReconciliationMode,
    fetch_timeout: Duration,
}

impl CacheSettingsBuilder {
    pub fn resiliency_period(mut self, period: Duration) -> Self {
        self.resiliency_period = period;
        self
    }

    pub fn mode(mut self, mode: ReconciliationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn build(self) -> CacheResult<CacheSettings> {
        if self.cache_period.is_zero() {
            return Err(CacheError::InvalidSettings(
                "cache period must be positive".to_string(),
            ));
        }
        if self.resiliency_period.is_zero() {
            return Err(CacheError::InvalidSettings(
                "resiliency period must be positive".to_string(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(CacheError::InvalidSettings(
                "fetch timeout must be positive".to_string(),
            ));
        }
        if self.resiliency_period > MAX_PERIOD {
            return Err(CacheError::InvalidSettings(format!(
                "resiliency period ({}ms) exceeds the {}ms maximum",
                self.resiliency_period.as_millis(),
                MAX_PERIOD.as_millis()
            )));
        }
        if self.resiliency_period < self.cache_period {
            return Err(CacheError::InvalidSettings(format!(
                "resiliency period ({}ms) is shorter than cache period ({}ms)",
                self.resiliency_period.as_millis(),
                self.cache_period.as_millis()
            )));
        }

        Ok(CacheSettings {
            cache_period: to_delta(self.cache_period, "cache period")?,
            resiliency_period: to_delta(self.resiliency_period, "resiliency period")?,
            mode: self.mode,
            fetch_timeout: self.fetch_timeout,
        })
    }
}

fn to_delta(period: Duration, what: &str) -> CacheResult<TimeDelta> {
    TimeDelta::from_std(period)
        .map_err(|_| CacheError::InvalidSettings(format!("{what} is out of range")))
}

impl TryFrom<&CacheConfig> for CacheSettings {
    type Error = CacheError;

    fn try_from(config: &CacheConfig) -> CacheResult<Self> {
        CacheSettings::builder(Duration::from_millis(config.cache_period_ms))
            .resiliency_period(Duration::from_millis(config.resiliency_period_ms))
            .mode(config.mode)
            .fetch_timeout(Duration::from_millis(config.fetch_timeout_ms))
            .build()
    }
}
