//! Location queries
//!
//! A `LocationQuery` is the cache key: every variant is normalized at
//! construction so that equivalent inputs compare and hash identically.

use crate::error::{CacheError, CacheResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

// Both components are finite by construction and -0.0 is folded into 0.0,
// so bitwise comparison is a lawful equivalence.
impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Coordinates {}

impl Hash for Coordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

/// Where to fetch weather for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationQuery {
    /// Geographic coordinates
    Coordinates(Coordinates),
    /// Postal code with its ISO 3166-1 alpha-2 country code
    ZipCode { zip: String, country: String },
    /// City name with an optional country code
    City {
        name: String,
        country: Option<String>,
    },
}

impl LocationQuery {
    /// Build a coordinates query
    pub fn coordinates(latitude: f64, longitude: f64) -> CacheResult<Self> {
        let raw = format!("{latitude},{longitude}");
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CacheError::invalid_query(raw, "latitude must be within [-90, 90]"));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CacheError::invalid_query(raw, "longitude must be within [-180, 180]"));
        }

        Ok(Self::Coordinates(Coordinates {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        }))
    }

    /// Build a zip code query
    pub fn zip_code(zip: &str, country: &str) -> CacheResult<Self> {
        let zip = normalize(zip);
        let country = normalize(country);
        if zip.is_empty() {
            return Err(CacheError::invalid_query(
                format!("{zip},{country}"),
                "zip code is empty",
            ));
        }
        if country.is_empty() {
            return Err(CacheError::invalid_query(zip, "country code is required for zip codes"));
        }
        Ok(Self::ZipCode { zip, country })
    }

    /// Build a city query
    pub fn city(name: &str, country: Option<&str>) -> CacheResult<Self> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(CacheError::invalid_query(name, "city name is empty"));
        }
        let country = country.map(normalize).filter(|c| !c.is_empty());
        Ok(Self::City { name, country })
    }

    /// Query parameters identifying this location to OpenWeatherMap
    pub fn request_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            Self::ZipCode { zip, country } => vec![("zip", format!("{zip},{country}"))],
            Self::City { name, country } => match country {
                Some(country) => vec![("q", format!("{name},{country}"))],
                None => vec![("q", name.clone())],
            },
        }
    }

    /// File name stem used when persisting the last raw response
    pub fn file_stem(&self) -> String {
        let raw = match self {
            Self::Coordinates(c) => {
                format!("{}-{}", c.latitude, c.longitude).replace('.', "_")
            }
            Self::ZipCode { zip, country } => format!("{zip}-{country}"),
            Self::City { name, country } => match country {
                Some(country) => format!("{name}-{country}"),
                None => name.clone(),
            },
        };

        raw.chars()
            .map(|c| match c {
                'a'..='z' | '0'..='9' | '-' | '_' => c,
                _ => '_',
            })
            .collect()
    }
}

fn normalize(part: &str) -> String {
    part.trim().to_lowercase()
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates(c) => write!(f, "coord:{},{}", c.latitude, c.longitude),
            Self::ZipCode { zip, country } => write!(f, "zip:{},{}", zip, country),
            Self::City {
                name,
                country: Some(country),
            } => write!(f, "city:{},{}", name, country),
            Self::City {
                name,
                country: None,
            } => write!(f, "city:{}", name),
        }
    }
}

impl Serialize for LocationQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses `coord:<lat>,<lon>`, `zip:<zip>,<country>` or `city:<name>[,<country>]`
impl FromStr for LocationQuery {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once(':')
            .ok_or_else(|| CacheError::UnsupportedQuery(s.to_string()))?;

        match scheme.trim().to_ascii_lowercase().as_str() {
            "coord" | "coords" => {
                let (lat, lon) = rest
                    .split_once(',')
                    .ok_or_else(|| CacheError::invalid_query(s, "expected <lat>,<lon>"))?;
                let lat = lat
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| CacheError::invalid_query(s, format!("latitude: {e}")))?;
                let lon = lon
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| CacheError::invalid_query(s, format!("longitude: {e}")))?;
                Self::coordinates(lat, lon)
            }
            "zip" => {
                let (zip, country) = rest
                    .split_once(',')
                    .ok_or_else(|| CacheError::invalid_query(s, "expected <zip>,<country>"))?;
                Self::zip_code(zip, country)
            }
            "city" => match rest.split_once(',') {
                Some((name, country)) => Self::city(name, Some(country)),
                None => Self::city(rest, None),
            },
            _ => Err(CacheError::UnsupportedQuery(s.to_string())),
        }
    }
}
