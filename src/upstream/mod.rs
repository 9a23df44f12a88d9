//! Clients for the third-party data providers
//!
//! - [`ndbc`]: NOAA NDBC latest-observation text feed
//! - [`marine`]: Open-Meteo marine forecast API
//! - [`weather`]: weather.gov current conditions
//!
//! [`UpstreamClient`] implements [`ForecastSource`]. Its `fetch_*` methods
//! return a `Result` and are used where a failure must reach the caller (the
//! latest-observation route, the CLI). The batch aggregator uses the
//! trait's `Option` methods instead, where any failure is logged and becomes
//! `None`.

pub mod marine;
pub mod ndbc;
pub mod weather;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::metrics;
use crate::models::{Coordinates, LatestObservation};
use crate::utils::error::FetchError;

/// Source of live buoy and forecast data
///
/// Implementors provide the `fetch_*` methods. The provided methods apply
/// the null-on-failure contract: the error is logged and dropped.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_observation(&self, buoy_id: &str) -> Result<LatestObservation, FetchError>;

    async fn fetch_forecast(&self, coords: Coordinates) -> Result<Value, FetchError>;

    async fn fetch_current(&self, coords: Coordinates) -> Result<Value, FetchError>;

    /// Parsed NDBC latest observation, `None` on any failure
    async fn latest_observation(&self, buoy_id: &str) -> Option<LatestObservation> {
        match self.fetch_observation(buoy_id).await {
            Ok(obs) => Some(obs),
            Err(e) => {
                tracing::warn!(buoy_id = %buoy_id, error = %e, "Latest observation unavailable");
                None
            }
        }
    }

    /// Raw marine forecast payload, `None` on any failure
    async fn marine_forecast(&self, coords: Coordinates) -> Option<Value> {
        match self.fetch_forecast(coords).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(
                    lat = coords.latitude,
                    lon = coords.longitude,
                    error = %e,
                    "Marine forecast unavailable"
                );
                None
            }
        }
    }

    /// Raw current-conditions payload, `None` on any failure
    async fn current_weather(&self, coords: Coordinates) -> Option<Value> {
        match self.fetch_current(coords).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(
                    lat = coords.latitude,
                    lon = coords.longitude,
                    error = %e,
                    "Current weather unavailable"
                );
                None
            }
        }
    }
}

/// Endpoint and request settings shared by the three clients
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub ndbc_base_url: String,
    pub marine_base_url: String,
    pub weather_base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub marine_current_fields: String,
    pub length_unit: String,
    pub forecast_ttl: Duration,
    pub current_ttl: Duration,
}

impl UpstreamSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ndbc_base_url: config.upstream.ndbc_base_url.trim_end_matches('/').to_string(),
            marine_base_url: config.upstream.marine_base_url.trim_end_matches('/').to_string(),
            weather_base_url: config.upstream.weather_base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            user_agent: config.upstream.user_agent.clone(),
            marine_current_fields: config.upstream.marine_current_fields.clone(),
            length_unit: config.upstream.length_unit.clone(),
            forecast_ttl: config.forecast_ttl(),
            current_ttl: config.current_ttl(),
        }
    }

    /// Point every provider at one host; used with mock servers in tests
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.ndbc_base_url = base.clone();
        self.marine_base_url = base.clone();
        self.weather_base_url = base;
        self
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// HTTP client for all upstream providers, sharing one connection pool
pub struct UpstreamClient {
    client: Client,
    settings: UpstreamSettings,
    cache: Arc<TtlCache>,
}

impl UpstreamClient {
    /// Create a client with a fixed per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(settings: UpstreamSettings, cache: Arc<TtlCache>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| FetchError::Decode(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));

        let client = Client::builder()
            .timeout(settings.timeout)
            .gzip(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            settings,
            cache,
        })
    }

    pub fn from_config(config: &Config, cache: Arc<TtlCache>) -> Result<Self, FetchError> {
        Self::new(UpstreamSettings::from_config(config), cache)
    }

    pub fn settings(&self) -> &UpstreamSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    /// GET a URL and return the body, failing on non-2xx
    async fn get_text(
        &self,
        source: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, FetchError> {
        let result = self.send(url, query).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(FetchError::Timeout) => "timeout",
            Err(_) => "error",
        };
        metrics::record_upstream_request(source, outcome);
        result
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "Upstream GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }

    /// GET a URL and decode the body as JSON regardless of content type
    async fn get_json(
        &self,
        source: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, FetchError> {
        let body = self.get_text(source, url, query).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ForecastSource for UpstreamClient {
    async fn fetch_observation(&self, buoy_id: &str) -> Result<LatestObservation, FetchError> {
        self.fetch_latest_observation(buoy_id).await
    }

    async fn fetch_forecast(&self, coords: Coordinates) -> Result<Value, FetchError> {
        self.fetch_marine_forecast(coords).await
    }

    async fn fetch_current(&self, coords: Coordinates) -> Result<Value, FetchError> {
        self.fetch_current_weather(coords).await
    }
}
