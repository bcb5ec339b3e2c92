//! Configuration schema for weather-cache
//!
//! Configuration is stored at `~/.config/weather-cache/config.toml`

use crate::cache::ReconciliationMode;
use crate::fetch::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Upstream API settings
    pub api: ApiConfig,

    /// Cache timing and reconciliation
    pub cache: CacheConfig,

    /// Raw response persistence
    pub response_log: ResponseLogConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// OpenWeatherMap API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key (OPENWEATHERMAP_API_KEY or --api-key take precedence)
    pub api_key: Option<String>,

    /// Current weather endpoint
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Cache settings, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve cached readings younger than this without calling the API
    pub cache_period_ms: u64,

    /// Serve cached readings this young when the API fails (>= cache_period_ms)
    pub resiliency_period_ms: u64,

    /// What to do when the API reports an older measurement than cached
    pub mode: ReconciliationMode,

    /// Upstream request timeout
    pub fetch_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_period_ms: 60_000,
            resiliency_period_ms: 300_000,
            mode: ReconciliationMode::default(),
            fetch_timeout_ms: 5_000,
        }
    }
}

/// Raw response logging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseLogConfig {
    /// Write the last response per location to `dir`
    pub enabled: bool,

    /// Target directory
    pub dir: Option<PathBuf>,
}

impl ResponseLogConfig {
    /// Directory to log into, if logging is switched on
    pub fn active_dir(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.dir
            .clone()
            .or_else(|| Some(crate::config::ConfigManager::responses_dir()))
    }
}
