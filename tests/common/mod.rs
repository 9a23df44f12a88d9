//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use surfe_diem::cache::TtlCache;
use surfe_diem::config::Config;
use surfe_diem::models::{
    BuoyLocation, Coordinates, LatestObservation, SpotLocation, SwellComponent, TideStation,
    WaveSummary, WindWaveComponent,
};
use surfe_diem::server::{create_router, AppState};
use surfe_diem::storage::InMemoryStore;
use surfe_diem::upstream::ForecastSource;
use surfe_diem::utils::error::FetchError;

pub const ADMIN_KEY: &str = "test-admin-key";

pub const OCEAN_BEACH: (f64, f64) = (37.759, -122.510);

/// Buoy with a parseable NDBC location string
pub fn buoy(id: i32, location_id: &str, name: &str, weight: i32) -> BuoyLocation {
    BuoyLocation {
        id,
        location_id: location_id.to_string(),
        name: name.to_string(),
        url: Some(format!(
            "https://www.ndbc.noaa.gov/station_page.php?station={location_id}"
        )),
        description: None,
        location: Some("37.754 N 122.839 W (37\u{b0}45'14\" N 122\u{b0}50'20\" W)".to_string()),
        active: true,
        weight,
        station_id: None,
        date_created: None,
        date_updated: None,
    }
}

pub fn spot(id: i32, name: &str, slug: &str, lat: f64, lon: f64) -> SpotLocation {
    SpotLocation {
        id,
        name: name.to_string(),
        timezone: "America/Los_Angeles".to_string(),
        latitude: lat,
        longitude: lon,
        subregion_name: "San Francisco".to_string(),
        slug: Some(slug.to_string()),
    }
}

/// Store seeded with three active buoys (one with a broken location),
/// one inactive buoy, three spots and one tide station
pub fn seeded_store() -> InMemoryStore {
    let mut broken = buoy(3, "46042", "Monterey", 0);
    broken.location = Some("somewhere off the coast".to_string());

    let mut inactive = buoy(4, "46012", "Half Moon Bay", 50);
    inactive.active = false;

    InMemoryStore::with_data(
        vec![
            buoy(1, "46026", "San Francisco", 10),
            buoy(2, "46237", "San Francisco Bar", 20),
            broken,
            inactive,
        ],
        vec![
            spot(1, "Ocean Beach", "ocean-beach", OCEAN_BEACH.0, OCEAN_BEACH.1),
            spot(2, "Linda Mar", "linda-mar", 37.594, -122.502),
            spot(3, "Pipeline", "pipeline", 21.665, -158.053),
        ],
        vec![TideStation {
            id: 1,
            station_id: "9414290".to_string(),
            station_name: Some("San Francisco".to_string()),
            latitude: 37.806,
            longitude: -122.465,
        }],
    )
}

/// Forecast source returning canned payloads, or a fixed upstream status
#[derive(Default)]
pub struct StubSource {
    pub fail_status: Option<u16>,
}

impl StubSource {
    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
        }
    }

    fn check(&self, url: &str) -> Result<(), FetchError> {
        match self.fail_status {
            Some(status) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
            None => Ok(()),
        }
    }
}

pub fn sample_observation() -> LatestObservation {
    LatestObservation(
        WaveSummary {
            wave_height: Some("6.9 ft".to_string()),
            peak_period: Some("8 sec".to_string()),
            ..Default::default()
        },
        SwellComponent {
            swell_height: Some("2.6 ft".to_string()),
            period: Some("12.5 sec".to_string()),
            direction: Some("WSW".to_string()),
        },
        WindWaveComponent::default(),
    )
}

pub fn sample_forecast() -> Value {
    json!({
        "current": {
            "swell_wave_height": 4.3,
            "swell_wave_direction": 285,
            "swell_wave_period": 13,
            "wind_speed_10m": 9.1,
            "wind_direction_10m": 310
        }
    })
}

pub fn sample_current() -> Value {
    json!({
        "currentobservation": {
            "Temp": "58",
            "Weather": "Partly Cloudy"
        }
    })
}

#[async_trait]
impl ForecastSource for StubSource {
    async fn fetch_observation(&self, buoy_id: &str) -> Result<LatestObservation, FetchError> {
        self.check(&format!("ndbc/{buoy_id}"))?;
        Ok(sample_observation())
    }

    async fn fetch_forecast(&self, _coords: Coordinates) -> Result<Value, FetchError> {
        self.check("marine")?;
        Ok(sample_forecast())
    }

    async fn fetch_current(&self, _coords: Coordinates) -> Result<Value, FetchError> {
        self.check("weather")?;
        Ok(sample_current())
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.api_key = Some(ADMIN_KEY.to_string());
    config
}

pub fn build_state(config: Config, source: StubSource) -> AppState {
    AppState::new(
        config,
        Arc::new(seeded_store()),
        Arc::new(source),
        Arc::new(TtlCache::new()),
    )
}

/// Router over the seeded store and a healthy stub source
pub fn test_app() -> Router {
    create_router(build_state(test_config(), StubSource::default()))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
