//! Blocking client for the OpenWeatherMap 5-day / 3-hour forecast endpoint.
//!
//! Only `list[].dt` and `list[].main.temp` are read from the payload; every
//! other field is ignored. Temperatures are passed through in Kelvin.
//!
//! ```no_run
//! use forecast_cache::model::Coordinate;
//! use forecast_cache::policy::lfu::LfuCache;
//! use forecast_cache::source::{OpenWeatherClient, OpenWeatherConfig};
//!
//! let config = OpenWeatherConfig::default().with_api_key("my-key");
//! let client = OpenWeatherClient::new(config).unwrap();
//! let mut cache = LfuCache::new(16, client);
//! let temps = cache.query(Coordinate::new(47.36, -122.19), 1_659_722_400, 1_659_808_800);
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, FetchError};
use crate::model::{Coordinate, Sample, Series};
use crate::traits::ForecastSource;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";
pub const FORECAST_PATH: &str = "/data/2.5/forecast";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies longer than this are cut before landing in a [`FetchError`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: ForecastMain,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
}

/// Connection settings for [`OpenWeatherClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenWeatherConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OpenWeatherConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full forecast URL, tolerant of a trailing slash on the base.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), FORECAST_PATH)
    }
}

/// [`ForecastSource`] backed by OpenWeatherMap. Never retries.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    config: OpenWeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(config: OpenWeatherConfig) -> Result<Self, ConfigError> {
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::new("base url must not be empty"));
        }
        if config.timeout.is_zero() {
            return Err(ConfigError::new("timeout must be > 0"));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ConfigError::new(format!("failed to build http client: {err}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenWeatherConfig {
        &self.config
    }

    fn request(&self, coordinate: Coordinate) -> Result<String, FetchError> {
        let mut request = self.http.get(self.config.endpoint()).query(&[
            ("lat", coordinate.lat().to_string()),
            ("lon", coordinate.lon().to_string()),
        ]);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("appid", key)]);
        }

        let response = request
            .send()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        response
            .text()
            .map_err(|err| FetchError::Transport(err.to_string()))
    }
}

impl ForecastSource for OpenWeatherClient {
    fn fetch_forecast(&mut self, coordinate: Coordinate) -> Result<Series, FetchError> {
        let body = self.request(coordinate)?;
        let series = decode_forecast(&body)?;
        debug!(%coordinate, samples = series.len(), "fetched openweather forecast");
        Ok(series)
    }
}

/// Decodes a forecast payload, keeping sample order as received.
pub fn decode_forecast(body: &str) -> Result<Series, FetchError> {
    let payload: ForecastResponse =
        serde_json::from_str(body).map_err(|err| FetchError::Decode(err.to_string()))?;
    Ok(payload
        .list
        .into_iter()
        .map(|entry| Sample::new(entry.dt, entry.main.temp))
        .collect())
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
