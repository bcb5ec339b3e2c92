//! Scripted upstreams and cache builders shared by the integration tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use weather_cache::{
    CacheSettings, FetchError, Fetcher, LocationQuery, ManualClock, Observation,
    ReconciliationMode, Temperature, Weather, WeatherCache,
};

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn observation(celsius: f64, measured_at: DateTime<Utc>) -> Observation {
    let temperature = Temperature::from_celsius(celsius);
    Observation {
        weather: Weather {
            temperature,
            feels_like: temperature,
            temperature_min: temperature,
            temperature_max: temperature,
            humidity: 70.0,
            pressure: 1013.0,
            wind_speed: 3.5,
            wind_direction: 220.0,
            wind_gust: None,
            cloudiness: 40.0,
            visibility: Some(10_000.0),
            rain_1h: None,
            snow_1h: None,
            condition: Some("Clouds".to_string()),
            description: Some("scattered clouds".to_string()),
            location_name: "Oslo".to_string(),
            country: Some("NO".to_string()),
        },
        measured_at,
    }
}

pub fn oslo() -> LocationQuery {
    LocationQuery::city("Oslo", Some("no")).unwrap()
}

pub fn paris() -> LocationQuery {
    LocationQuery::coordinates(48.8566, 2.3522).unwrap()
}

/// Upstream whose answers are set by the test
pub struct ScriptedFetcher {
    calls: AtomicUsize,
    failing: AtomicBool,
    next: Mutex<(f64, DateTime<Utc>)>,
    delay: Duration,
}

impl ScriptedFetcher {
    pub fn new(measured_at: DateTime<Utc>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            next: Mutex::new((10.0, measured_at)),
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// What the next successful fetches return
    pub fn answer(&self, celsius: f64, measured_at: DateTime<Utc>) {
        *self.next.lock().unwrap() = (celsius, measured_at);
    }

    fn respond(&self) -> Result<Observation, FetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Transport("connection refused".to_string()));
        }
        let (celsius, measured_at) = *self.next.lock().unwrap();
        Ok(observation(celsius, measured_at))
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    fn fetch_blocking(
        &self,
        _query: &LocationQuery,
        _timeout: Duration,
    ) -> Result<Observation, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.respond()
    }

    async fn fetch(
        &self,
        _query: &LocationQuery,
        _timeout: Duration,
    ) -> Result<Observation, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.respond()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Async upstream that parks fetches for one location until released
pub struct GatedFetcher {
    gated: LocationQuery,
    calls: AtomicUsize,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedFetcher {
    pub fn new(gated: LocationQuery) -> Self {
        Self {
            gated,
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    fn fetch_blocking(
        &self,
        _query: &LocationQuery,
        _timeout: Duration,
    ) -> Result<Observation, FetchError> {
        Err(FetchError::Transport("blocking fetch not scripted".to_string()))
    }

    async fn fetch(
        &self,
        query: &LocationQuery,
        _timeout: Duration,
    ) -> Result<Observation, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *query == self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(observation(10.0, start()))
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// 1s cache period, 10s resiliency period
pub fn settings(mode: ReconciliationMode) -> CacheSettings {
    CacheSettings::builder(Duration::from_secs(1))
        .resiliency_period(Duration::from_secs(10))
        .mode(mode)
        .build()
        .unwrap()
}

pub fn scripted_cache(
    mode: ReconciliationMode,
) -> (WeatherCache, Arc<ScriptedFetcher>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let fetcher = Arc::new(ScriptedFetcher::new(start()));
    let cache = WeatherCache::new(settings(mode), fetcher.clone()).with_clock(clock.clone());
    (cache, fetcher, clock)
}
