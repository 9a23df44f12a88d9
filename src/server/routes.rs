//! REST API routes and handlers

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::batch::{BatchRequest, BatchResponse};
use crate::cache::CacheStatus;
use crate::error::Error;
use crate::metrics;
use crate::models::{
    BuoyLocation, BuoyLocationUpdate, Coordinates, FeatureCollection, LatestObservation,
    NewBuoyLocation, NewSpotLocation, SpotDistance, SpotLocation, TideStationDistance,
};
use crate::parser::{slugify, unique_slug};
use crate::storage::{ListQuery, DEFAULT_LIST_LIMIT};

use super::app::AppState;
use super::auth::AdminGuard;
use super::error::{ApiError, ApiResult};

/// Default search radius for the `find_closest` routes, in miles
const DEFAULT_RADIUS_MILES: f64 = 50.0;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct ClosestParams {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_radius")]
    pub dist: f64,
}

fn default_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_MILES
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub locations: Vec<BuoyLocation>,
    pub spots: Vec<SpotLocation>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service endpoints
        .route("/", get(root))
        .route("/api/v1/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        // Batch and cache endpoints
        .route("/api/v1/batch-forecast", post(batch_forecast))
        .route("/api/v1/cache/status", get(cache_status))
        .route("/api/v1/cache/clear", post(cache_clear))
        // Buoy location endpoints
        .route("/api/v1/locations", get(list_locations).post(create_location))
        .route("/api/v1/locations/geojson", get(locations_geojson))
        .route(
            "/api/v1/locations/{location_id}",
            get(get_location).put(update_location).delete(delete_location),
        )
        .route(
            "/api/v1/locations/{location_id}/latest-observation",
            get(latest_observation),
        )
        // Spot endpoints
        .route("/api/v1/spots", get(list_spots).post(create_spot))
        .route("/api/v1/spots/geojson", get(spots_geojson))
        .route("/api/v1/spots/find_closest", get(closest_spots))
        .route("/api/v1/spots/{id}", get(get_spot))
        // Search and tides
        .route("/api/v1/search", get(search))
        .route("/api/v1/tides/find_closest", get(closest_tide_station))
        .with_state(state)
}

// ============================================================================
// Service Handlers
// ============================================================================

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "hello from surfe-diem" }))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = match state.store.health_check().await {
        Ok(()) => "healthy",
        Err(e) => {
            let err = Error::from(e);
            tracing::warn!(
                error = %err,
                category = err.category().as_str(),
                recoverable = err.is_recoverable(),
                "Store health check failed"
            );
            "degraded"
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn metrics_endpoint() -> axum::response::Response {
    match metrics::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => ApiError::Internal(format!("Failed to encode metrics: {e}")).into_response(),
    }
}

// ============================================================================
// Batch / Cache Handlers
// ============================================================================

/// Forecasts for many buoys and spots in one round trip
///
/// Malformed bodies, including unknown fields, are rejected by the `Json`
/// extractor with 422 before anything runs.
async fn batch_forecast(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<Json<BatchResponse>> {
    let response = state.aggregator.run(request).await?;
    Ok(Json(response))
}

async fn cache_status(State(state): State<AppState>) -> Json<CacheStatus> {
    Json(state.cache.status().await)
}

async fn cache_clear(State(state): State<AppState>) -> Json<MessageResponse> {
    let removed = state.cache.clear().await;
    Json(MessageResponse {
        message: format!("Cache cleared ({removed} entries removed)"),
    })
}

// ============================================================================
// Buoy Location Handlers
// ============================================================================

async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<BuoyLocation>>> {
    let query = ListQuery::new(params.limit, params.search);
    Ok(Json(state.store.list_buoys(&query).await?))
}

/// Active buoys as GeoJSON; buoys with unusable coordinates are left out
async fn locations_geojson(State(state): State<AppState>) -> ApiResult<Json<FeatureCollection>> {
    let buoys = state.store.list_buoys(&ListQuery::new(usize::MAX, None)).await?;

    let features: Vec<_> = buoys
        .iter()
        .filter_map(|buoy| match buoy.to_feature() {
            Ok(feature) => Some(feature),
            Err(e) => {
                tracing::warn!(location_id = %buoy.location_id, error = %e, "Skipping buoy in GeoJSON");
                None
            }
        })
        .collect();

    if features.is_empty() {
        return Err(ApiError::NotFound("No locations found".to_string()));
    }
    Ok(Json(FeatureCollection::new(features)))
}

async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> ApiResult<Json<BuoyLocation>> {
    Ok(Json(state.store.get_buoy(&location_id).await?))
}

/// Live observation as `[wave_summary, swell, wind_wave]`
async fn latest_observation(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> ApiResult<Json<LatestObservation>> {
    let observation = state.source.fetch_observation(&location_id).await?;
    Ok(Json(observation))
}

async fn create_location(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Json(payload): Json<NewBuoyLocation>,
) -> ApiResult<(StatusCode, Json<BuoyLocation>)> {
    payload.validate().map_err(ApiError::BadRequest)?;
    let created = state.store.create_buoy(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_location(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(update): Json<BuoyLocationUpdate>,
) -> ApiResult<Json<BuoyLocation>> {
    update.validate().map_err(ApiError::BadRequest)?;
    Ok(Json(state.store.update_buoy(id, update).await?))
}

async fn delete_location(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.store.delete_buoy(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Spot Handlers
// ============================================================================

async fn list_spots(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<SpotLocation>>> {
    let query = ListQuery::new(params.limit, params.search);
    let spots = state.store.list_spots(&query).await?;
    if spots.is_empty() {
        return Err(ApiError::NotFound("No spots found".to_string()));
    }
    Ok(Json(spots))
}

async fn spots_geojson(State(state): State<AppState>) -> ApiResult<Json<FeatureCollection>> {
    let spots = state.store.all_spots().await?;
    if spots.is_empty() {
        return Err(ApiError::NotFound("No spots found".to_string()));
    }
    Ok(Json(FeatureCollection::new(
        spots.iter().map(SpotLocation::to_feature).collect(),
    )))
}

/// Spots closer than `dist` miles to a point, nearest first
async fn closest_spots(
    State(state): State<AppState>,
    Query(params): Query<ClosestParams>,
) -> ApiResult<Json<Vec<SpotDistance>>> {
    let origin = validated_point(&params)?;
    let spots = state.store.all_spots().await?;

    let mut nearby: Vec<SpotDistance> = spots
        .into_iter()
        .filter_map(|spot| {
            let distance = origin.distance_miles(&spot.coordinates());
            (distance < params.dist).then(|| SpotDistance {
                id: spot.id,
                name: spot.name,
                subregion_name: spot.subregion_name,
                distance,
                latitude: spot.latitude,
                longitude: spot.longitude,
            })
        })
        .collect();

    if nearby.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No spots within {} miles",
            params.dist
        )));
    }

    nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(Json(nearby))
}

async fn get_spot(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SpotLocation>> {
    Ok(Json(state.store.get_spot(id).await?))
}

/// Create a spot under a slug derived from its name
async fn create_spot(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Json(payload): Json<NewSpotLocation>,
) -> ApiResult<(StatusCode, Json<SpotLocation>)> {
    payload.validate().map_err(ApiError::BadRequest)?;

    let base = slugify(&payload.name)?;
    let taken = state.store.slugs_with_base(&base).await?;
    let slug = unique_slug(&base, |candidate| taken.iter().any(|s| s == candidate));

    let created = state.store.create_spot(payload, slug).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ============================================================================
// Search / Tide Handlers
// ============================================================================

/// Buoys (active or not) and spots whose names contain `q`; a blank `q` matches everything
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let query = ListQuery::new(params.limit, Some(params.q.clone())).including_inactive();
    let (locations, spots) = tokio::join!(
        state.store.list_buoys(&query),
        state.store.list_spots(&query)
    );
    let (locations, spots) = (locations?, spots?);

    if locations.is_empty() && spots.is_empty() {
        return Err(ApiError::NotFound(format!("Nothing matches '{}'", params.q)));
    }
    Ok(Json(SearchResponse { locations, spots }))
}

/// Nearest tide station closer than `dist` miles
async fn closest_tide_station(
    State(state): State<AppState>,
    Query(params): Query<ClosestParams>,
) -> ApiResult<Json<TideStationDistance>> {
    let origin = validated_point(&params)?;
    let stations = state.store.list_tide_stations().await?;
    if stations.is_empty() {
        return Err(ApiError::NotFound("No tide stations available".to_string()));
    }

    stations
        .into_iter()
        .map(|station| {
            let distance =
                origin.distance_miles(&Coordinates::new(station.latitude, station.longitude));
            (station, distance)
        })
        .filter(|(_, distance)| *distance < params.dist)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(station, distance)| {
            Json(TideStationDistance {
                station_id: station.station_id,
                distance,
                latitude: station.latitude,
                longitude: station.longitude,
            })
        })
        .ok_or_else(|| {
            ApiError::NotFound(format!("No tide station within {} miles", params.dist))
        })
}

fn validated_point(params: &ClosestParams) -> ApiResult<Coordinates> {
    if !(-90.0..=90.0).contains(&params.lat) || !(-180.0..=180.0).contains(&params.lng) {
        return Err(ApiError::BadRequest(format!(
            "Invalid coordinates ({}, {})",
            params.lat, params.lng
        )));
    }
    if !(params.dist.is_finite() && params.dist >= 0.0) {
        return Err(ApiError::BadRequest(format!("Invalid distance {}", params.dist)));
    }
    Ok(Coordinates::new(params.lat, params.lng))
}
