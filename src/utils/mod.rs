//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

/// Mean Earth radius in statute miles
const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// Great-circle distance in miles between two `(lat, lon)` points
pub fn haversine_miles(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Round a coordinate to two decimal places for cache keying
pub fn round_coordinate(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
