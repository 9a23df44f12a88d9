//! Free-text coordinate parsing for NDBC station locations
//!
//! NDBC publishes station positions as `"34.5 N 120.5 W"`, frequently
//! followed by a degrees/minutes/seconds rendering in parentheses:
//! `"37.754 N 122.839 W (37°45'14\" N 122°50'20\" W)"`. Only the decimal
//! part before the parenthesis is used.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Coordinates;
use crate::utils::error::ParseError;

static COORDINATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([+-]?\d+(?:\.\d+)?)\s*([NSns])[\s,]+([+-]?\d+(?:\.\d+)?)\s*([EWew])").unwrap()
});

/// Parse `"<lat> <N|S> <lon> <E|W>"` into coordinates
///
/// South latitudes and West longitudes are negated. The result is range
/// checked; use [`Coordinates::to_lon_lat`] for the GeoJSON `[lon, lat]`
/// position.
///
/// # Errors
///
/// Returns [`ParseError`] when no pattern is found or a value is out of range.
///
/// # Examples
///
/// ```
/// use surfe_diem::parser::parse_coordinates;
///
/// let coords = parse_coordinates("34.5 N 120.5 W").unwrap();
/// assert_eq!(coords.to_lon_lat(), [-120.5, 34.5]);
/// ```
pub fn parse_coordinates(text: &str) -> Result<Coordinates, ParseError> {
    let decimal_part = text.split('(').next().unwrap_or_default();

    let caps = COORDINATE_REGEX
        .captures(decimal_part)
        .ok_or_else(|| ParseError::CoordinatesNotFound(text.to_string()))?;

    let mut latitude = parse_number(&caps[1])?;
    let mut longitude = parse_number(&caps[3])?;

    if caps[2].eq_ignore_ascii_case("S") {
        latitude = -latitude;
    }
    if caps[4].eq_ignore_ascii_case("W") {
        longitude = -longitude;
    }

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ParseError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ParseError::LongitudeOutOfRange(longitude));
    }

    Ok(Coordinates::new(latitude, longitude))
}

fn parse_number(raw: &str) -> Result<f64, ParseError> {
    raw.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}
