//! NOAA NDBC latest-observation feed

use super::UpstreamClient;
use crate::models::LatestObservation;
use crate::parser::parse_latest_observation;
use crate::utils::error::FetchError;

pub(crate) const SOURCE: &str = "ndbc";

impl UpstreamClient {
    /// Raw latest-observation text for a station
    pub async fn fetch_observation_text(&self, buoy_id: &str) -> Result<String, FetchError> {
        if buoy_id.is_empty() || !buoy_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FetchError::InvalidUrl(format!("invalid station id '{buoy_id}'")));
        }

        let url = format!("{}/data/latest_obs/{}.txt", self.settings.ndbc_base_url, buoy_id);
        self.get_text(SOURCE, &url, &[]).await
    }

    /// Fetch and parse the latest observation for a station
    pub async fn fetch_latest_observation(
        &self,
        buoy_id: &str,
    ) -> Result<LatestObservation, FetchError> {
        let text = self.fetch_observation_text(buoy_id).await?;
        Ok(parse_latest_observation(&text))
    }
}
