//! Error types for weather-cache
//!
//! `CacheError` covers everything a caller can see: bad input, bad
//! configuration, cancellation. `FetchError` covers upstream failures and
//! never leaves the cache; it is folded into a failed `Reading` instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for weather-cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced to callers of the cache and the CLI
#[derive(Error, Debug)]
pub enum CacheError {
    // Caller errors
    #[error("Unsupported location query: {0}")]
    UnsupportedQuery(String),

    #[error("Invalid location query {query}: {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("Invalid cache settings: {0}")]
    InvalidSettings(String),

    #[error("OpenWeatherMap API key not configured")]
    MissingApiKey,

    #[error("Invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    // Cancellation (async path only)
    #[error("Lookup cancelled")]
    Cancelled,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown configuration key: {0}")]
    ConfigKeyUnknown(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid query error
    pub fn invalid_query(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Caller errors fail immediately and are never cached or retried
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedQuery(_)
                | Self::InvalidQuery { .. }
                | Self::InvalidSettings(_)
                | Self::MissingApiKey
                | Self::InvalidBaseUrl { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingApiKey => {
                Some("Set OPENWEATHERMAP_API_KEY, pass --api-key, or run: weather-cache config set api.api_key <KEY>")
            }
            Self::UnsupportedQuery(_) => {
                Some("Use coord:<lat>,<lon>, zip:<zip>,<country> or city:<name>[,<country>]")
            }
            Self::InvalidSettings(_) => {
                Some("resiliency_period_ms must be >= cache_period_ms and all periods must be positive")
            }
            _ => None,
        }
    }
}

/// Upstream failures, as seen by the cache orchestrator
///
/// The orchestrator does not discriminate between kinds; they only differ in
/// the message carried into the failed reading.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("could not decode upstream payload: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
