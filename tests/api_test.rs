//! HTTP API tests driving the router with `tower::ServiceExt::oneshot`

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;
use surfe_diem::server::create_router;

// ============================================================================
// Service routes
// ============================================================================

#[tokio::test]
async fn test_root_greeting() {
    let app = test_app();
    let response = send(&app, get("/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"message": "hello from surfe-diem"})
    );
}

#[tokio::test]
async fn test_health_reports_version() {
    let app = test_app();
    let response = send(&app, get("/api/v1/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// ============================================================================
// Batch forecast
// ============================================================================

#[tokio::test]
async fn test_batch_forecast_mixed_request() {
    let app = test_app();
    let request = json_request(
        Method::POST,
        "/api/v1/batch-forecast",
        json!({"buoy_ids": ["46026", "99999"], "spot_ids": [1, 404]}),
        None,
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let buoys = body["buoys"].as_array().unwrap();
    let spots = body["spots"].as_array().unwrap();
    let errors = body["errors"].as_array().unwrap();

    assert_eq!(buoys.len(), 1);
    assert_eq!(buoys[0]["id"], "46026");
    assert_eq!(buoys[0]["observation"][1]["swell_height"], "2.6 ft");
    assert_eq!(buoys[0]["weather"]["swell"]["height"], 4.3);
    assert_eq!(buoys[0]["weather"]["current"], serde_json::Value::Null);

    assert_eq!(spots.len(), 1);
    assert_eq!(spots[0]["slug"], "ocean-beach");
    assert_eq!(spots[0]["weather"]["swell"]["period"], 13);
    assert_eq!(spots[0]["weather"]["current"], serde_json::Value::Null);

    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors[0],
        json!({"id": "99999", "type": "buoy", "error": "Buoy location not found"})
    );
    assert_eq!(
        errors[1],
        json!({"id": 404, "type": "spot", "error": "Spot location not found"})
    );
}

#[tokio::test]
async fn test_batch_forecast_spot_current_conditions_switch() {
    let mut config = test_config();
    config.batch.spot_current_conditions = true;
    let app = create_router(build_state(config, StubSource::default()));

    let request = json_request(
        Method::POST,
        "/api/v1/batch-forecast",
        json!({"spot_ids": [1]}),
        None,
    );
    let body = body_json(send(&app, request).await).await;
    assert_eq!(
        body["spots"][0]["weather"]["current"],
        json!({"temperature": "58", "conditions": "Partly Cloudy"})
    );
}

#[tokio::test]
async fn test_batch_forecast_upstream_down_still_succeeds() {
    let app = create_router(build_state(test_config(), StubSource::failing(503)));
    let request = json_request(
        Method::POST,
        "/api/v1/batch-forecast",
        json!({"buoy_ids": ["46026"]}),
        None,
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["buoys"][0]["observation"], serde_json::Value::Null);
    assert_eq!(
        body["buoys"][0]["weather"],
        json!({"swell": null, "wind": null, "current": null})
    );
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_forecast_empty_body() {
    let app = test_app();
    let request = json_request(Method::POST, "/api/v1/batch-forecast", json!({}), None);
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"buoys": [], "spots": [], "errors": []})
    );
}

#[tokio::test]
async fn test_batch_forecast_rejects_malformed_body() {
    let app = test_app();

    let unknown_field = json_request(
        Method::POST,
        "/api/v1/batch-forecast",
        json!({"buoy_ids": ["46026"], "stations": []}),
        None,
    );
    assert_eq!(
        send(&app, unknown_field).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let wrong_type = json_request(
        Method::POST,
        "/api/v1/batch-forecast",
        json!({"spot_ids": ["one"]}),
        None,
    );
    assert_eq!(
        send(&app, wrong_type).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

// ============================================================================
// Buoy locations
// ============================================================================

#[tokio::test]
async fn test_list_locations_orders_by_weight() {
    let app = test_app();
    let response = send(&app, get("/api/v1/locations")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["location_id"].as_str().unwrap())
        .collect();
    // Inactive 46012 is hidden despite the highest weight
    assert_eq!(ids, vec!["46237", "46026", "46042"]);
}

#[tokio::test]
async fn test_list_locations_search_and_limit() {
    let app = test_app();

    let body = body_json(send(&app, get("/api/v1/locations?search=bar")).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["location_id"], "46237");

    let body = body_json(send(&app, get("/api/v1/locations?limit=1")).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_locations_geojson_skips_bad_coordinates() {
    let app = test_app();
    let response = send(&app, get("/api/v1/locations/geojson")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["geometry"]["type"], "Point");

    let coords = features[0]["geometry"]["coordinates"].as_array().unwrap();
    assert!((coords[0].as_f64().unwrap() + 122.839).abs() < 1e-9);
    assert!((coords[1].as_f64().unwrap() - 37.754).abs() < 1e-9);
}

#[tokio::test]
async fn test_get_location_by_station_id() {
    let app = test_app();

    let response = send(&app, get("/api/v1/locations/46026")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "San Francisco");

    let response = send(&app, get("/api/v1/locations/00000")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_latest_observation_is_three_element_array() {
    let app = test_app();
    let response = send(&app, get("/api/v1/locations/46026/latest-observation")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let parts = body.as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["wave_height"], "6.9 ft");
    assert_eq!(parts[1]["direction"], "WSW");
    // Absent fields are omitted, not null
    assert_eq!(parts[2], json!({}));
}

#[tokio::test]
async fn test_latest_observation_upstream_failure_is_bad_gateway() {
    let app = create_router(build_state(test_config(), StubSource::failing(404)));
    let response = send(&app, get("/api/v1/locations/46026/latest-observation")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("404"));
}

// ============================================================================
// Admin guard
// ============================================================================

fn new_buoy() -> serde_json::Value {
    json!({
        "location_id": "46214",
        "name": "Point Reyes",
        "location": "37.946 N 123.469 W (37\u{b0}56'46\" N 123\u{b0}28'8\" W)",
        "weight": 5
    })
}

#[tokio::test]
async fn test_create_location_requires_bearer_token() {
    let app = test_app();

    let missing = json_request(Method::POST, "/api/v1/locations", new_buoy(), None);
    assert_eq!(send(&app, missing).await.status(), StatusCode::UNAUTHORIZED);

    let wrong = json_request(Method::POST, "/api/v1/locations", new_buoy(), Some("nope"));
    assert_eq!(send(&app, wrong).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_disabled_without_key() {
    let app = create_router(build_state(
        surfe_diem::config::Config::default(),
        StubSource::default(),
    ));
    let request = json_request(Method::POST, "/api/v1/locations", new_buoy(), Some(ADMIN_KEY));
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Admin routes are disabled");
}

#[tokio::test]
async fn test_create_location_and_conflict() {
    let app = test_app();

    let request = json_request(Method::POST, "/api/v1/locations", new_buoy(), Some(ADMIN_KEY));
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["location_id"], "46214");
    assert_eq!(body["active"], true);

    let again = json_request(Method::POST, "/api/v1/locations", new_buoy(), Some(ADMIN_KEY));
    assert_eq!(send(&app, again).await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_location_rejects_bad_coordinates() {
    let app = test_app();
    let mut payload = new_buoy();
    payload["location"] = json!("nowhere");

    let request = json_request(Method::POST, "/api/v1/locations", payload, Some(ADMIN_KEY));
    assert_eq!(send(&app, request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_location() {
    let app = test_app();

    let update = json_request(
        Method::PUT,
        "/api/v1/locations/1",
        json!({"weight": 99, "description": "Outer buoy"}),
        Some(ADMIN_KEY),
    );
    let response = send(&app, update).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["weight"], 99);
    assert_eq!(body["name"], "San Francisco");

    let delete = json_request(Method::DELETE, "/api/v1/locations/1", json!({}), Some(ADMIN_KEY));
    assert_eq!(send(&app, delete).await.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        send(&app, get("/api/v1/locations/46026")).await.status(),
        StatusCode::NOT_FOUND
    );

    let delete_again =
        json_request(Method::DELETE, "/api/v1/locations/1", json!({}), Some(ADMIN_KEY));
    assert_eq!(send(&app, delete_again).await.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Spots
// ============================================================================

#[tokio::test]
async fn test_list_spots_sorted_by_name() {
    let app = test_app();
    let body = body_json(send(&app, get("/api/v1/spots")).await).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Linda Mar", "Ocean Beach", "Pipeline"]);

    let response = send(&app, get("/api/v1/spots?search=mavericks")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spots_geojson_properties() {
    let app = test_app();
    let body = body_json(send(&app, get("/api/v1/spots/geojson")).await).await;

    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    let ocean_beach = features
        .iter()
        .find(|f| f["properties"]["slug"] == "ocean-beach")
        .unwrap();
    assert_eq!(
        ocean_beach["geometry"]["coordinates"],
        json!([OCEAN_BEACH.1, OCEAN_BEACH.0])
    );
    assert_eq!(ocean_beach["properties"]["timezone"], "America/Los_Angeles");
}

#[tokio::test]
async fn test_get_spot_by_id() {
    let app = test_app();
    assert_eq!(send(&app, get("/api/v1/spots/2")).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, get("/api/v1/spots/42")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_find_closest_spots_sorted_by_distance() {
    let app = test_app();
    let response = send(&app, get("/api/v1/spots/find_closest?lat=37.76&lng=-122.51")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let spots = body.as_array().unwrap();
    assert_eq!(spots.len(), 2);
    assert_eq!(spots[0]["name"], "Ocean Beach");
    assert_eq!(spots[1]["name"], "Linda Mar");
    assert!(spots[0]["distance"].as_f64().unwrap() < spots[1]["distance"].as_f64().unwrap());

    let narrow = send(&app, get("/api/v1/spots/find_closest?lat=37.76&lng=-122.51&dist=1")).await;
    assert_eq!(body_json(narrow).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_closest_spots_nothing_in_range() {
    let app = test_app();

    // The radius is exclusive: a zero radius never matches, even on top of a spot
    let uri = format!(
        "/api/v1/spots/find_closest?lat={}&lng={}&dist=0",
        OCEAN_BEACH.0, OCEAN_BEACH.1
    );
    assert_eq!(send(&app, get(&uri)).await.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/api/v1/spots/find_closest?lat=0&lng=0")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/api/v1/spots/find_closest?lat=120&lng=0")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_spot_generates_unique_slug() {
    let app = test_app();
    let payload = json!({
        "name": "Ocean Beach",
        "timezone": "America/Los_Angeles",
        "latitude": 37.75,
        "longitude": -122.51,
        "subregion_name": "San Francisco"
    });

    let first = json_request(Method::POST, "/api/v1/spots", payload.clone(), Some(ADMIN_KEY));
    let response = send(&app, first).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["slug"], "ocean-beach-1");

    let second = json_request(Method::POST, "/api/v1/spots", payload, Some(ADMIN_KEY));
    let response = send(&app, second).await;
    assert_eq!(body_json(response).await["slug"], "ocean-beach-2");
}

#[tokio::test]
async fn test_create_spot_requires_admin() {
    let app = test_app();
    let payload = json!({
        "name": "Kelly Slater Wave",
        "timezone": "America/Los_Angeles",
        "latitude": 36.3,
        "longitude": -119.8,
        "subregion_name": "Central Valley"
    });
    let request = json_request(Method::POST, "/api/v1/spots", payload, None);
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Search and tides
// ============================================================================

#[tokio::test]
async fn test_search_matches_buoys_and_spots() {
    let app = test_app();
    let body = body_json(send(&app, get("/api/v1/search?q=san")).await).await;

    assert_eq!(body["locations"].as_array().unwrap().len(), 2);
    assert!(body["spots"].as_array().unwrap().is_empty());

    let body = body_json(send(&app, get("/api/v1/search?q=PIPE")).await).await;
    assert_eq!(body["spots"][0]["slug"], "pipeline");
}

#[tokio::test]
async fn test_search_includes_inactive_buoys() {
    let app = test_app();
    let body = body_json(send(&app, get("/api/v1/search?q=half%20moon")).await).await;

    assert_eq!(body["locations"][0]["location_id"], "46012");
    assert_eq!(body["locations"][0]["active"], false);
}

#[tokio::test]
async fn test_search_no_match_and_blank_query() {
    let app = test_app();
    assert_eq!(
        send(&app, get("/api/v1/search?q=zzz")).await.status(),
        StatusCode::NOT_FOUND
    );

    // A blank query matches everything
    let response = send(&app, get("/api/v1/search?q=%20")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["locations"].as_array().unwrap().len(), 4);
    assert_eq!(body["spots"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_closest_tide_station() {
    let app = test_app();
    let response = send(&app, get("/api/v1/tides/find_closest?lat=37.76&lng=-122.51")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["station_id"], "9414290");
    assert!(body["distance"].as_f64().unwrap() < 5.0);

    let response = send(&app, get("/api/v1/tides/find_closest?lat=21.6&lng=-158.0")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_cache_status_and_clear() {
    let state = build_state(test_config(), StubSource::default());
    state
        .cache
        .set(
            "weather_forecast_37.76_-122.51",
            json!({"current": {}}),
            std::time::Duration::from_secs(60),
        )
        .await;
    state.cache.get("weather_forecast_37.76_-122.51").await;
    state.cache.get("weather_forecast_0.00_0.00").await;
    let app = create_router(state);

    let body = body_json(send(&app, get("/api/v1/cache/status")).await).await;
    assert_eq!(body["cache_size"], 1);
    assert_eq!(body["cache_keys"], json!(["weather_forecast_37.76_-122.51"]));
    assert_eq!(body["hits"], 1);
    assert_eq!(body["misses"], 1);
    assert_eq!(body["hit_rate"], 0.5);

    let clear = json_request(Method::POST, "/api/v1/cache/clear", json!({}), None);
    let response = send(&app, clear).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["message"]
        .as_str()
        .unwrap()
        .starts_with("Cache cleared"));

    let body = body_json(send(&app, get("/api/v1/cache/status")).await).await;
    assert_eq!(body["cache_size"], 0);
}
