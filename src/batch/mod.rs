//! Batch forecast aggregation
//!
//! One request carries a list of buoy station ids and a list of spot ids.
//! Each id ends up in exactly one place in the response: a forecast entry
//! or an error record.
//!
//! - Ids are de-duplicated (first occurrence wins) and resolved against the
//!   store with one query per kind.
//! - Unknown ids and buoys with unparsable coordinates become error records.
//! - A buoy fetches its observation and marine forecast; a spot fetches its
//!   marine forecast, plus current conditions when that is switched on.
//! - Every resolved item fans out its upstream calls concurrently. The
//!   number of calls in flight is capped by a semaphore and the whole batch
//!   is bounded by a deadline.
//! - An upstream failure, or a call still pending at the deadline, only nulls
//!   the affected field. The item itself is still returned.

pub mod weather;

pub use weather::{extract_essential_weather, EssentialWeather};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::config::{BatchConfig, MAX_CONCURRENT_FETCHES, MAX_REQUEST_DEADLINE_SECS};
use crate::metrics;
use crate::models::{BuoyLocation, Coordinates, LatestObservation, SpotLocation};
use crate::storage::{LocationStore, StoreResult};
use crate::upstream::ForecastSource;

// ============================================================================
// Request / response
// ============================================================================

/// Body of `POST /api/v1/batch-forecast`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchRequest {
    #[serde(default)]
    pub buoy_ids: Option<Vec<String>>,
    #[serde(default)]
    pub spot_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResponse {
    pub buoys: Vec<BuoyForecast>,
    pub spots: Vec<SpotForecast>,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuoyForecast {
    pub id: String,
    pub name: String,
    pub observation: Option<LatestObservation>,
    pub weather: EssentialWeather,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpotForecast {
    pub id: i32,
    pub name: String,
    pub slug: Option<String>,
    pub weather: EssentialWeather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Buoy,
    Spot,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buoy => "buoy",
            Self::Spot => "spot",
        }
    }
}

/// Identifier as the client sent it: a station code or a spot number
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemId {
    Buoy(String),
    Spot(i32),
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub error: String,
}

impl BatchError {
    fn buoy(id: &str, error: impl Into<String>) -> Self {
        Self {
            id: ItemId::Buoy(id.to_string()),
            kind: ItemKind::Buoy,
            error: error.into(),
        }
    }

    fn spot(id: i32, error: impl Into<String>) -> Self {
        Self {
            id: ItemId::Spot(id),
            kind: ItemKind::Spot,
            error: error.into(),
        }
    }
}

// ============================================================================
// Aggregator
// ============================================================================

pub struct BatchAggregator {
    store: Arc<dyn LocationStore>,
    source: Arc<dyn ForecastSource>,
    max_concurrent_fetches: usize,
    deadline: Duration,
    spot_current_conditions: bool,
}

impl BatchAggregator {
    pub fn new(
        store: Arc<dyn LocationStore>,
        source: Arc<dyn ForecastSource>,
        max_concurrent_fetches: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            store,
            source,
            max_concurrent_fetches: max_concurrent_fetches.clamp(1, MAX_CONCURRENT_FETCHES),
            deadline: deadline.min(Duration::from_secs(MAX_REQUEST_DEADLINE_SECS)),
            spot_current_conditions: false,
        }
    }

    /// Also fetch weather.gov current conditions for every spot
    pub fn with_spot_current_conditions(mut self, enabled: bool) -> Self {
        self.spot_current_conditions = enabled;
        self
    }

    pub fn from_config(
        store: Arc<dyn LocationStore>,
        source: Arc<dyn ForecastSource>,
        config: &BatchConfig,
    ) -> Self {
        Self::new(store, source, config.max_concurrent_fetches, config.deadline())
            .with_spot_current_conditions(config.spot_current_conditions)
    }

    /// Resolve ids, fetch everything, assemble the response
    ///
    /// Only a store failure fails the whole batch; upstream failures never do.
    pub async fn run(&self, request: BatchRequest) -> StoreResult<BatchResponse> {
        let _timer = metrics::start_batch_timer();
        let deadline = Instant::now() + self.deadline;
        let semaphore = Semaphore::new(self.max_concurrent_fetches);

        let buoy_ids = dedup(request.buoy_ids.unwrap_or_default());
        let spot_ids = dedup(request.spot_ids.unwrap_or_default());

        tracing::info!(
            buoys = buoy_ids.len(),
            spots = spot_ids.len(),
            "Batch forecast requested"
        );

        let mut errors = Vec::new();

        // Resolution: one query per kind
        let found_buoys: HashMap<String, BuoyLocation> = self
            .store
            .buoys_by_location_ids(&buoy_ids)
            .await?
            .into_iter()
            .map(|b| (b.location_id.clone(), b))
            .collect();
        let found_spots: HashMap<i32, SpotLocation> = self
            .store
            .spots_by_ids(&spot_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut buoy_jobs = Vec::new();
        for id in &buoy_ids {
            let Some(buoy) = found_buoys.get(id) else {
                errors.push(BatchError::buoy(id, "Buoy location not found"));
                continue;
            };
            match buoy.coordinates() {
                Ok(coords) => buoy_jobs.push((buoy, coords)),
                Err(e) => {
                    tracing::warn!(buoy_id = %id, error = %e, "Unusable buoy coordinates");
                    errors.push(BatchError::buoy(id, format!("Failed to prepare buoy data: {e}")));
                }
            }
        }

        let mut spot_jobs = Vec::new();
        for id in &spot_ids {
            match found_spots.get(id) {
                Some(spot) => spot_jobs.push(spot),
                None => errors.push(BatchError::spot(*id, "Spot location not found")),
            }
        }

        let buoy_errors = buoy_ids.len() - buoy_jobs.len();
        let spot_errors = spot_ids.len() - spot_jobs.len();

        // Fan-out
        let buoy_futures = buoy_jobs
            .into_iter()
            .map(|(buoy, coords)| self.buoy_forecast(buoy, coords, &semaphore, deadline));
        let spot_futures = spot_jobs
            .into_iter()
            .map(|spot| self.spot_forecast(spot, &semaphore, deadline));

        let (buoys, spots) = tokio::join!(join_all(buoy_futures), join_all(spot_futures));

        metrics::record_batch_items(ItemKind::Buoy.as_str(), buoys.len(), buoy_errors);
        metrics::record_batch_items(ItemKind::Spot.as_str(), spots.len(), spot_errors);

        tracing::info!(
            buoys = buoys.len(),
            spots = spots.len(),
            errors = errors.len(),
            "Batch forecast assembled"
        );

        Ok(BatchResponse {
            buoys,
            spots,
            errors,
        })
    }

    async fn buoy_forecast(
        &self,
        buoy: &BuoyLocation,
        coords: Coordinates,
        semaphore: &Semaphore,
        deadline: Instant,
    ) -> BuoyForecast {
        let (observation, forecast) = tokio::join!(
            bounded(
                semaphore,
                deadline,
                "observation",
                self.source.latest_observation(&buoy.location_id)
            ),
            bounded(
                semaphore,
                deadline,
                "marine_forecast",
                self.source.marine_forecast(coords)
            ),
        );

        BuoyForecast {
            id: buoy.location_id.clone(),
            name: buoy.name.clone(),
            observation,
            weather: extract_essential_weather(forecast.as_ref(), None),
        }
    }

    async fn spot_forecast(
        &self,
        spot: &SpotLocation,
        semaphore: &Semaphore,
        deadline: Instant,
    ) -> SpotForecast {
        let coords = spot.coordinates();
        let current = async {
            if !self.spot_current_conditions {
                return None;
            }
            bounded(
                semaphore,
                deadline,
                "current_weather",
                self.source.current_weather(coords),
            )
            .await
        };
        let (forecast, current) = tokio::join!(
            bounded(
                semaphore,
                deadline,
                "marine_forecast",
                self.source.marine_forecast(coords)
            ),
            current,
        );

        SpotForecast {
            id: spot.id,
            name: spot.name.clone(),
            slug: spot.slug.clone(),
            weather: extract_essential_weather(forecast.as_ref(), current.as_ref()),
        }
    }
}

/// Run one upstream call under a semaphore permit, giving up at `deadline`
async fn bounded<T, F>(
    semaphore: &Semaphore,
    deadline: Instant,
    what: &'static str,
    fetch: F,
) -> Option<T>
where
    F: Future<Output = Option<T>>,
{
    let guarded = async {
        let _permit = semaphore.acquire().await.ok()?;
        fetch.await
    };

    match tokio::time::timeout_at(deadline, guarded).await {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(fetch = what, "Batch deadline reached; field left empty");
            None
        }
    }
}

/// Drop repeated ids, keeping first-seen order
fn dedup<T: Eq + Hash + Clone>(ids: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
