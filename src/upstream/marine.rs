//! Open-Meteo marine forecast

use serde_json::Value;

use super::UpstreamClient;
use crate::cache::CacheNamespace;
use crate::models::Coordinates;
use crate::utils::error::FetchError;

pub(crate) const SOURCE: &str = "open_meteo_marine";

impl UpstreamClient {
    /// Current marine conditions for a point, read through the forecast cache
    ///
    /// Only successful payloads are cached; a failure is retried on the next
    /// request.
    pub async fn fetch_marine_forecast(&self, coords: Coordinates) -> Result<Value, FetchError> {
        let key = CacheNamespace::Forecast.key(&coords);
        if let Some(cached) = self.cache.lookup(CacheNamespace::Forecast, &key).await {
            tracing::debug!(key = %key, "Marine forecast cache hit");
            return Ok(cached);
        }

        let url = format!("{}/v1/marine", self.settings.marine_base_url);
        let query = [
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("current", self.settings.marine_current_fields.clone()),
            ("length_unit", self.settings.length_unit.clone()),
        ];

        let payload = self.get_json(SOURCE, &url, &query).await?;
        self.cache
            .set(&key, payload.clone(), self.settings.forecast_ttl)
            .await;
        Ok(payload)
    }
}
