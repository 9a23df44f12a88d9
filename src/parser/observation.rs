//! NDBC latest-observation text feed parser
//!
//! The feed at `/data/latest_obs/{station}.txt` looks like:
//!
//! ```text
//! Station 46026
//! 37°45'14" N 122°50'20" W
//!
//! 7:50 am PDT
//! 1450 GMT 10/16/26
//! Wind: NW (310°), 17.5 kt
//! Seas: 6.9 ft
//! Peak Period: 8 sec
//! ...
//! Wave Summary
//! 7:40 am PDT
//! Swell: 2.6 ft
//! Period: 12.5 sec
//! Direction: WSW
//! Wind Wave: 6.6 ft
//! Period: 7.1 sec
//! Direction: NW
//! ```
//!
//! `Period` and `Direction` appear twice. The first occurrence of each
//! belongs to the swell component and the second to the wind-wave
//! component. This depends on NDBC keeping that line order.

use crate::models::{LatestObservation, SwellComponent, WaveSummary, WindWaveComponent};

/// Number of header lines (station, position, blank, local time, GMT time)
const HEADER_LINES: usize = 5;

/// Parse the latest-observation text into its three components
///
/// Unknown labels are ignored. A third `Period` or `Direction` line is
/// logged and dropped rather than overwriting the wind-wave value.
pub fn parse_latest_observation(raw: &str) -> LatestObservation {
    let mut summary = WaveSummary::default();
    let mut swell = SwellComponent::default();
    let mut wind_wave = WindWaveComponent::default();

    let mut periods_seen = 0usize;
    let mut directions_seen = 0usize;
    let mut wind_wave_started = false;

    for line in raw.lines().skip(HEADER_LINES) {
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split(':');
        let label = parts.next().unwrap_or_default().trim().to_lowercase();
        let Some(value) = parts.next().map(|v| v.trim().to_string()) else {
            continue;
        };

        match label.as_str() {
            "seas" => summary.wave_height = Some(value),
            "peak period" => summary.peak_period = Some(value),
            "water temp" => summary.water_temp = Some(value),
            "pres" => summary.atmospheric_pressure = Some(value),
            "air temp" => summary.air_temp = Some(value),
            "dew point" => summary.dew_point = Some(value),
            "swell" => swell.swell_height = Some(value),
            "wind wave" => {
                wind_wave_started = true;
                wind_wave.wind_wave_height = Some(value);
            }
            "period" => {
                periods_seen += 1;
                match periods_seen {
                    1 => {
                        if wind_wave_started {
                            tracing::warn!(
                                "First Period line follows Wind Wave; attributing to swell anyway"
                            );
                        }
                        swell.period = Some(value);
                    }
                    2 => wind_wave.period = Some(value),
                    n => tracing::warn!(occurrence = n, "Unexpected extra Period line ignored"),
                }
            }
            "direction" => {
                directions_seen += 1;
                match directions_seen {
                    1 => {
                        if wind_wave_started {
                            tracing::warn!(
                                "First Direction line follows Wind Wave; attributing to swell anyway"
                            );
                        }
                        swell.direction = Some(value);
                    }
                    2 => wind_wave.direction = Some(value),
                    n => tracing::warn!(occurrence = n, "Unexpected extra Direction line ignored"),
                }
            }
            _ => {}
        }
    }

    LatestObservation(summary, swell, wind_wave)
}
