//! Weather readings
//!
//! `Observation` is what a fetch yields; `Reading` is what the cache hands
//! back, stamped with when it was fetched and where it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A temperature, stored in Kelvin as reported upstream
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    const KELVIN_OFFSET: f64 = 273.15;

    pub fn from_kelvin(kelvin: f64) -> Self {
        Self(kelvin)
    }

    pub fn from_celsius(celsius: f64) -> Self {
        Self(celsius + Self::KELVIN_OFFSET)
    }

    pub fn kelvin(&self) -> f64 {
        self.0
    }

    pub fn celsius(&self) -> f64 {
        self.0 - Self::KELVIN_OFFSET
    }

    pub fn fahrenheit(&self) -> f64 {
        self.celsius() * 9.0 / 5.0 + 32.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C", self.celsius())
    }
}

/// Normalized current conditions for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: Temperature,
    pub feels_like: Temperature,
    pub temperature_min: Temperature,
    pub temperature_max: Temperature,

    /// Relative humidity, %
    pub humidity: f64,

    /// Sea-level pressure, hPa
    pub pressure: f64,

    /// Wind speed, m/s
    pub wind_speed: f64,

    /// Wind direction, meteorological degrees
    pub wind_direction: f64,

    pub wind_gust: Option<f64>,

    /// Cloud cover, %
    pub cloudiness: f64,

    /// Visibility, meters
    pub visibility: Option<f64>,

    /// Precipitation over the last hour, mm
    pub rain_1h: Option<f64>,
    pub snow_1h: Option<f64>,

    /// Short condition group, e.g. "Rain"
    pub condition: Option<String>,
    pub description: Option<String>,

    /// Location name as resolved upstream
    pub location_name: String,
    pub country: Option<String>,
}

/// The decoded result of one successful fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub weather: Weather,

    /// When the upstream observed or computed the data
    pub measured_at: DateTime<Utc>,
}

/// A reading returned to callers
///
/// Failed readings carry no weather and an error description instead;
/// `is_successful` is the only thing a caller needs to check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub weather: Option<Weather>,

    /// When the upstream observed or computed the data
    pub measured_at: DateTime<Utc>,

    /// When this process completed the fetch that produced the data
    pub fetched_at: DateTime<Utc>,

    /// Served from the cache rather than from the fetch made by this call
    pub is_from_cache: bool,

    /// This call made an upstream request
    pub api_request_made: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reading {
    /// A reading built from a fetch that completed at `fetched_at`
    pub fn fetched(observation: Observation, fetched_at: DateTime<Utc>) -> Self {
        Self {
            weather: Some(observation.weather),
            measured_at: observation.measured_at,
            fetched_at,
            is_from_cache: false,
            api_request_made: true,
            error: None,
        }
    }

    /// A failure placeholder
    pub fn failed(error: impl Into<String>, at: DateTime<Utc>, api_request_made: bool) -> Self {
        Self {
            weather: None,
            measured_at: at,
            fetched_at: at,
            is_from_cache: false,
            api_request_made,
            error: Some(error.into()),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.weather.is_some()
    }

    /// Stamp the provenance flags just before handing the reading out
    pub(crate) fn served(mut self, is_from_cache: bool, api_request_made: bool) -> Self {
        self.is_from_cache = is_from_cache;
        self.api_request_made = api_request_made;
        self
    }
}
