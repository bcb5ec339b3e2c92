//! OpenWeatherMap current weather client

use super::payload::{decode_current_weather, upstream_error};
use super::response_log::ResponseLogger;
use super::Fetcher;
use crate::error::{CacheError, CacheResult, FetchError};
use crate::query::LocationQuery;
use crate::reading::Observation;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Current weather endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// HTTP fetcher for the OpenWeatherMap current weather API
///
/// Requests are plain blocking `ureq` calls; the async flavour runs the same
/// call on tokio's blocking pool.
#[derive(Clone)]
pub struct OpenWeatherMapClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: Url,
    response_log: Option<Arc<dyn ResponseLogger>>,
}

impl OpenWeatherMapClient {
    /// Create a client for the public endpoint
    pub fn new(api_key: impl Into<String>) -> CacheResult<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(CacheError::MissingApiKey);
        }

        Ok(Self {
            agent: ureq::Agent::new_with_defaults(),
            api_key,
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            response_log: None,
        })
    }

    /// Point the client at a different endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: &str) -> CacheResult<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Persist every successful raw response
    pub fn with_response_log(mut self, logger: Arc<dyn ResponseLogger>) -> Self {
        self.response_log = Some(logger);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full request URL; `nonce` defeats intermediary caches
    pub fn request_url(&self, query: &LocationQuery, nonce: Uuid) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.request_params() {
                pairs.append_pair(name, &value);
            }
            pairs.append_pair("appid", &self.api_key);
            pairs.append_pair("cache", &nonce.to_string());
        }
        url
    }

    /// One request; the response is logged unless `abandoned` is already set
    fn fetch_now(
        &self,
        query: &LocationQuery,
        timeout: Duration,
        abandoned: &AtomicBool,
    ) -> Result<Observation, FetchError> {
        let url = self.request_url(query, Uuid::new_v4());
        debug!("Requesting current weather for {} from {}", query, self.base_url);

        let mut response = self
            .agent
            .get(url.as_str())
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache, no-store")
            .config()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .call()
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport_error(e, timeout))?;

        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }

        if let Some(logger) = &self.response_log {
            if abandoned.load(Ordering::SeqCst) {
                debug!("Lookup for {} was abandoned, not logging its response", query);
            } else {
                logger.log(query, &body);
            }
        }

        decode_current_weather(&body)
    }
}

impl fmt::Debug for OpenWeatherMapClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherMapClient")
            .field("base_url", &self.base_url.as_str())
            .field("response_log", &self.response_log.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Fetcher for OpenWeatherMapClient {
    fn fetch_blocking(
        &self,
        query: &LocationQuery,
        timeout: Duration,
    ) -> Result<Observation, FetchError> {
        self.fetch_now(query, timeout, &AtomicBool::new(false))
    }

    async fn fetch(
        &self,
        query: &LocationQuery,
        timeout: Duration,
    ) -> Result<Observation, FetchError> {
        let client = self.clone();
        let query = query.clone();
        let abandoned = Arc::new(AtomicBool::new(false));
        // The blocking request outlives this future when a timeout or
        // cancellation drops it; the flag keeps it from logging.
        let _abandon_on_drop = AbandonOnDrop(Arc::clone(&abandoned));

        tokio::task::spawn_blocking(move || client.fetch_now(&query, timeout, &abandoned))
            .await
            .map_err(|e| FetchError::Transport(format!("fetch task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "openweathermap"
    }
}

/// Marks the in-flight blocking request as abandoned when dropped
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn parse_base_url(raw: &str) -> CacheResult<Url> {
    let url = Url::parse(raw).map_err(|e| CacheError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CacheError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    Ok(url)
}

fn transport_error(err: ureq::Error, timeout: Duration) -> FetchError {
    match err {
        ureq::Error::Timeout(_) => FetchError::Timeout(timeout),
        other => FetchError::Transport(other.to_string()),
    }
}
