//! weather-cache - single-flight cache for OpenWeatherMap readings
//!
//! Serves the latest reading per location while keeping upstream calls to
//! a minimum: one request in flight per location, a hard freshness window,
//! and a resiliency window that rides out upstream outages with stale data.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod query;
pub mod reading;
pub mod ui;

pub use cache::{CacheSettings, ReconciliationMode, WeatherCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CacheResult, FetchError};
pub use fetch::{Fetcher, OpenWeatherMapClient};
pub use query::LocationQuery;
pub use reading::{Observation, Reading, Temperature, Weather};
