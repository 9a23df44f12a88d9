// Core data structures for surfe-diem

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::parser;
use crate::utils::error::ParseError;
use crate::utils::haversine_miles;

/// A point on the globe
///
/// Stored as named fields so that callers never have to remember the axis
/// order. Use [`Coordinates::to_lon_lat`] when a GeoJSON position is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// GeoJSON position: `[longitude, latitude]`
    pub fn to_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Great-circle distance in miles
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        haversine_miles(
            (self.latitude, self.longitude),
            (other.latitude, other.longitude),
        )
    }
}

// ============================================================================
// Buoy locations
// ============================================================================

/// NOAA buoy station as stored in `buoy_location`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuoyLocation {
    /// Surrogate key
    pub id: i32,
    /// NOAA station code (e.g. "46026"), unique
    pub location_id: String,
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    /// Free-text coordinates, e.g. `"37.754 N 122.839 W (37°45'14\" N 122°50'20\" W)"`
    pub location: Option<String>,
    pub active: bool,
    /// Higher weights are listed first
    pub weight: i32,
    /// Linked NOAA tide station, when one is mapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    pub date_created: Option<NaiveDateTime>,
    pub date_updated: Option<NaiveDateTime>,
}

impl BuoyLocation {
    /// Parse the free-text location into coordinates
    pub fn coordinates(&self) -> Result<Coordinates, ParseError> {
        let text = self.location.as_deref().unwrap_or_default();
        parser::parse_coordinates(text)
    }

    /// GeoJSON feature for map display
    pub fn to_feature(&self) -> Result<Feature, ParseError> {
        let coords = self.coordinates()?;
        Ok(Feature::point(
            coords,
            json!({
                "id": self.location_id,
                "name": self.name,
                "description": self.description,
                "url": self.url,
                "location": self.location,
            }),
        ))
    }
}

/// Payload for creating a buoy location
#[derive(Debug, Clone, Deserialize)]
pub struct NewBuoyLocation {
    pub location_id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub weight: i32,
}

fn default_active() -> bool {
    true
}

impl NewBuoyLocation {
    pub fn validate(&self) -> Result<(), String> {
        if self.location_id.trim().is_empty() {
            return Err("location_id must not be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if let Some(location) = &self.location {
            parser::parse_coordinates(location).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Partial update for a buoy location; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuoyLocationUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub active: Option<bool>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub weight: Option<i32>,
}

impl BuoyLocationUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("name must not be empty".to_string());
            }
        }
        if let Some(location) = &self.location {
            parser::parse_coordinates(location).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Apply the update onto an existing record
    pub fn apply(self, buoy: &mut BuoyLocation) {
        if let Some(name) = self.name {
            buoy.name = name;
        }
        if let Some(url) = self.url {
            buoy.url = Some(url);
        }
        if let Some(active) = self.active {
            buoy.active = active;
        }
        if let Some(description) = self.description {
            buoy.description = Some(description);
        }
        if let Some(location) = self.location {
            buoy.location = Some(location);
        }
        if let Some(weight) = self.weight {
            buoy.weight = weight;
        }
    }
}

// ============================================================================
// Surf spots
// ============================================================================

/// Curated surf spot as stored in `spot_location`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLocation {
    pub id: i32,
    pub name: String,
    /// IANA timezone, e.g. "America/Los_Angeles"
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub subregion_name: String,
    pub slug: Option<String>,
}

impl SpotLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn to_feature(&self) -> Feature {
        Feature::point(
            self.coordinates(),
            json!({
                "id": self.id,
                "name": self.name,
                "timezone": self.timezone,
                "subregion_name": self.subregion_name,
                "slug": self.slug,
            }),
        )
    }
}

/// Payload for creating a spot; the slug is generated server-side
#[derive(Debug, Clone, Deserialize)]
pub struct NewSpotLocation {
    pub name: String,
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub subregion_name: String,
}

impl NewSpotLocation {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        Ok(())
    }
}

/// Spot annotated with its distance from a query point
#[derive(Debug, Clone, Serialize)]
pub struct SpotDistance {
    pub id: i32,
    pub name: String,
    pub subregion_name: String,
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
}

// ============================================================================
// Tide stations
// ============================================================================

/// NOAA Tides & Currents station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideStation {
    pub id: i32,
    pub station_id: String,
    pub station_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Tide station annotated with its distance from a query point
#[derive(Debug, Clone, Serialize)]
pub struct TideStationDistance {
    pub station_id: String,
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
}

// ============================================================================
// Latest buoy observation
// ============================================================================

/// Overall sea state block of the NDBC latest-observation feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_temp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atmospheric_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_temp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<String>,
}

/// Long-period swell component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwellComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swell_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

/// Locally generated wind-wave component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindWaveComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_wave_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

/// Parsed latest observation; serializes as `[wave_summary, swell, wind_wave]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestObservation(pub WaveSummary, pub SwellComponent, pub WindWaveComponent);

impl LatestObservation {
    pub fn wave_summary(&self) -> &WaveSummary {
        &self.0
    }

    pub fn swell(&self) -> &SwellComponent {
        &self.1
    }

    pub fn wind_wave(&self) -> &WindWaveComponent {
        &self.2
    }
}

// ============================================================================
// GeoJSON
// ============================================================================

/// GeoJSON point geometry
#[derive(Debug, Clone, Serialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

/// GeoJSON feature with free-form properties
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: PointGeometry,
    pub properties: serde_json::Value,
}

impl Feature {
    pub fn point(coords: Coordinates, properties: serde_json::Value) -> Self {
        Self {
            kind: "Feature",
            geometry: PointGeometry {
                kind: "Point",
                coordinates: coords.to_lon_lat(),
            },
            properties,
        }
    }
}

/// GeoJSON feature collection
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }
}
