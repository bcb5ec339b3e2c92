//! Upstream fetchers
//!
//! The cache talks to the upstream only through the `Fetcher` trait, which
//! offers a blocking and an async flavour of the same call.

mod openweathermap;
mod payload;
pub mod response_log;

pub use openweathermap::{OpenWeatherMapClient, DEFAULT_BASE_URL};
pub use payload::decode_current_weather;
pub use response_log::{FileResponseLogger, ResponseLogger};

use crate::error::FetchError;
use crate::query::LocationQuery;
use crate::reading::Observation;
use async_trait::async_trait;
use std::time::Duration;

/// Source of current observations for a location
///
/// Implementations must give up after `timeout`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch on the calling thread
    fn fetch_blocking(
        &self,
        query: &LocationQuery,
        timeout: Duration,
    ) -> Result<Observation, FetchError>;

    /// Fetch without blocking the calling task
    async fn fetch(&self, query: &LocationQuery, timeout: Duration)
        -> Result<Observation, FetchError>;

    /// Human-readable upstream name for logs
    fn name(&self) -> &'static str;
}
