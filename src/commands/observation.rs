use std::sync::Arc;

use anyhow::{Context, Result};

use surfe_diem::cache::TtlCache;
use surfe_diem::config::Config;
use surfe_diem::error::{self, Error};
use surfe_diem::upstream::UpstreamClient;

/// Fetch and print the latest NDBC observation for one buoy
pub async fn observation(buoy_id: String, config: Config) -> Result<()> {
    let client = UpstreamClient::from_config(&config, Arc::new(TtlCache::new()))
        .context("Failed to build upstream client")?;

    match fetch_rendered(&client, &buoy_id).await {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                buoy_id = %buoy_id,
                category = e.category().as_str(),
                recoverable = e.is_recoverable(),
                "Observation failed: {}",
                e
            );
            if let Some(hint) = failure_hint(&e) {
                eprintln!("{hint}");
            }
            Err(anyhow::Error::new(e)
                .context(format!("Failed to fetch observation for buoy {buoy_id}")))
        }
    }
}

async fn fetch_rendered(client: &UpstreamClient, buoy_id: &str) -> error::Result<String> {
    let observation = client.fetch_latest_observation(buoy_id).await?;
    Ok(serde_json::to_string_pretty(&observation)?)
}

fn failure_hint(err: &Error) -> Option<&'static str> {
    if err.is_recoverable() {
        Some("NDBC may be temporarily unavailable; try again in a few minutes.")
    } else {
        None
    }
}
