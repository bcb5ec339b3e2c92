//! Reconciling a fresh fetch with the cached reading
//!
//! The upstream sometimes answers with an observation older than the one
//! already cached. The mode decides which reading wins and whether the
//! cached one gets its lease extended.

use crate::reading::Reading;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to resolve a `measured_at` regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconciliationMode {
    /// Keep the cached reading; the next call after the cache period fetches
    /// again. Frequent calls may hit the upstream harder.
    AlwaysUseLastMeasured,
    /// Keep the cached reading and restart its cache period from the fetch
    /// that just happened.
    #[default]
    AlwaysUseLastMeasuredButExtendCache,
    /// Always adopt what the upstream just returned.
    AlwaysUseLastFetchedValue,
}

impl ReconciliationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlwaysUseLastMeasured => "always-use-last-measured",
            Self::AlwaysUseLastMeasuredButExtendCache => "always-use-last-measured-but-extend-cache",
            Self::AlwaysUseLastFetchedValue => "always-use-last-fetched-value",
        }
    }

    fn all() -> &'static [Self] {
        &[
            Self::AlwaysUseLastMeasured,
            Self::AlwaysUseLastMeasuredButExtendCache,
            Self::AlwaysUseLastFetchedValue,
        ]
    }
}

impl fmt::Display for ReconciliationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconciliationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| {
                let names: Vec<_> = Self::all().iter().map(|m| m.as_str()).collect();
                format!("unknown mode '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// Outcome of reconciliation
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Store and return the fetched reading
    Adopt(Reading),
    /// Return the cached reading; when `extend` is set, its `fetched_at` has
    /// already been moved to the new fetch time and it must be stored back
    KeepCached { reading: Reading, extend: bool },
}

/// Decide between the cached reading and a successfully fetched one
pub fn reconcile(mode: ReconciliationMode, cached: Option<&Reading>, fetched: Reading) -> Reconciliation {
    let cached = match cached {
        Some(cached) if cached.is_successful() => cached,
        _ => return Reconciliation::Adopt(fetched),
    };

    if fetched.measured_at >= cached.measured_at
        || mode == ReconciliationMode::AlwaysUseLastFetchedValue
    {
        return Reconciliation::Adopt(fetched);
    }

    match mode {
        ReconciliationMode::AlwaysUseLastMeasuredButExtendCache => {
            let mut reading = cached.clone();
            reading.fetched_at = fetched.fetched_at;
            Reconciliation::KeepCached {
                reading,
                extend: true,
            }
        }
        _ => Reconciliation::KeepCached {
            reading: cached.clone(),
            extend: false,
        },
    }
}
