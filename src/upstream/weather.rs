//! weather.gov current conditions (`MapClick.php`, JSON flavour)

use serde_json::Value;

use super::UpstreamClient;
use crate::cache::CacheNamespace;
use crate::models::Coordinates;
use crate::utils::error::FetchError;

pub(crate) const SOURCE: &str = "weather_gov";

impl UpstreamClient {
    /// Current observation for a point, read through the current-weather cache
    ///
    /// The payload is keyed by `currentobservation`; a body without it is
    /// treated as a decode failure and not cached.
    pub async fn fetch_current_weather(&self, coords: Coordinates) -> Result<Value, FetchError> {
        let key = CacheNamespace::CurrentWeather.key(&coords);
        if let Some(cached) = self.cache.lookup(CacheNamespace::CurrentWeather, &key).await {
            tracing::debug!(key = %key, "Current weather cache hit");
            return Ok(cached);
        }

        let url = format!("{}/MapClick.php", self.settings.weather_base_url);
        let query = [
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
            ("unit", "0".to_string()),
            ("lg", "english".to_string()),
            ("FcstType", "json".to_string()),
        ];

        let payload = self.get_json(SOURCE, &url, &query).await?;
        if payload.get("currentobservation").is_none() {
            return Err(FetchError::Decode(
                "response has no currentobservation".to_string(),
            ));
        }

        self.cache
            .set(&key, payload.clone(), self.settings.current_ttl)
            .await;
        Ok(payload)
    }
}
