//! OpenWeatherMap "current weather" payloads

use crate::error::FetchError;
use crate::reading::{Observation, Temperature, Weather};
use chrono::DateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ApiWeatherResult {
    #[serde(default)]
    weather: Vec<ApiCondition>,
    main: ApiMain,
    #[serde(default)]
    visibility: Option<f64>,
    #[serde(default)]
    wind: ApiWind,
    #[serde(default)]
    clouds: ApiClouds,
    #[serde(default)]
    rain: Option<ApiVolume>,
    #[serde(default)]
    snow: Option<ApiVolume>,
    /// Unix seconds of the observation
    dt: i64,
    #[serde(default)]
    sys: ApiSys,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
    #[serde(default)]
    gust: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiClouds {
    #[serde(default)]
    all: f64,
}

#[derive(Debug, Deserialize)]
struct ApiVolume {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSys {
    #[serde(default)]
    country: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct ApiErrorResult {
    #[serde(default)]
    message: String,
}

/// Decode a successful response body into an observation
pub fn decode_current_weather(body: &str) -> Result<Observation, FetchError> {
    let result: ApiWeatherResult = serde_json::from_str(body)?;

    let measured_at = DateTime::from_timestamp(result.dt, 0)
        .ok_or_else(|| FetchError::Decode(format!("observation time {} out of range", result.dt)))?;

    let condition = result.weather.into_iter().next();
    let weather = Weather {
        temperature: Temperature::from_kelvin(result.main.temp),
        feels_like: Temperature::from_kelvin(result.main.feels_like),
        temperature_min: Temperature::from_kelvin(result.main.temp_min),
        temperature_max: Temperature::from_kelvin(result.main.temp_max),
        humidity: result.main.humidity,
        pressure: result.main.pressure,
        wind_speed: result.wind.speed,
        wind_direction: result.wind.deg,
        wind_gust: result.wind.gust,
        cloudiness: result.clouds.all,
        visibility: result.visibility,
        rain_1h: result.rain.and_then(|v| v.one_hour),
        snow_1h: result.snow.and_then(|v| v.one_hour),
        condition: condition.as_ref().map(|c| c.main.clone()),
        description: condition.map(|c| c.description),
        location_name: result.name,
        country: result.sys.country,
    };

    Ok(Observation {
        weather,
        measured_at,
    })
}

/// Turn a non-2xx response into an upstream error
pub(crate) fn upstream_error(status: u16, body: &str) -> FetchError {
    let message = serde_json::from_str::<ApiErrorResult>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(500).collect());

    FetchError::Upstream { status, message }
}

#[cfg(test)]
pub(crate) const SAMPLE: &str = r#"{
    "coord": {"lon": -122.1237, "lat": 48.6371},
    "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
    "base": "stations",
    "main": {"temp": 285.15, "feels_like": 284.6, "temp_min": 284.0, "temp_max": 286.5,
             "pressure": 1012, "humidity": 81},
    "visibility": 10000,
    "wind": {"speed": 4.12, "deg": 200, "gust": 7.2},
    "clouds": {"all": 75},
    "rain": {"1h": 0.42},
    "dt": 1700000000,
    "sys": {"type": 2, "id": 2041694, "country": "US", "sunrise": 1699975000, "sunset": 1700009000},
    "timezone": -28800,
    "id": 5809844,
    "name": "Sedro-Woolley",
    "cod": 200
}"#;
