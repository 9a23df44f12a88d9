//! Reduction of raw forecast payloads to the fields the app displays

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Swell, wind and current conditions; each part is `null` when unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EssentialWeather {
    pub swell: Option<Value>,
    pub wind: Option<Value>,
    pub current: Option<Value>,
}

/// Pull swell, wind and current conditions out of upstream payloads
///
/// Values are copied through untouched, so integers stay integers. Missing
/// or partial data yields `None` for that part, never an error.
pub fn extract_essential_weather(
    forecast: Option<&Value>,
    current_weather: Option<&Value>,
) -> EssentialWeather {
    let current_block = forecast
        .and_then(|f| f.get("current"))
        .and_then(Value::as_object);
    let hourly_block = forecast
        .and_then(|f| f.get("hourly"))
        .and_then(Value::as_object);

    let swell = current_block
        .and_then(current_swell)
        .or_else(|| hourly_block.and_then(hourly_swell));

    let wind = current_block.and_then(|block| {
        let speed = present(block, "wind_speed_10m")?;
        let direction = present(block, "wind_direction_10m")?;
        Some(json!({ "speed": speed, "direction": direction }))
    });

    let current = current_weather
        .and_then(|w| w.get("currentobservation"))
        .and_then(Value::as_object)
        .map(|obs| {
            json!({
                "temperature": obs.get("Temp").cloned().unwrap_or(Value::Null),
                "conditions": obs.get("Weather").cloned().unwrap_or(Value::Null),
            })
        });

    EssentialWeather {
        swell,
        wind,
        current,
    }
}

fn current_swell(block: &Map<String, Value>) -> Option<Value> {
    let height = present(block, "swell_wave_height")?;
    let direction = present(block, "swell_wave_direction")?;
    let period = present(block, "swell_wave_period")?;
    Some(json!({ "height": height, "direction": direction, "period": period }))
}

/// First hour of the combined wave series
fn hourly_swell(block: &Map<String, Value>) -> Option<Value> {
    let first = |name: &str| {
        block
            .get(name)
            .and_then(Value::as_array)
            .and_then(|series| series.first())
            .filter(|v| !v.is_null())
            .cloned()
    };
    let height = first("wave_height")?;
    let direction = first("wave_direction")?;
    let period = first("wave_period")?;
    Some(json!({ "height": height, "direction": direction, "period": period }))
}

fn present(block: &Map<String, Value>, name: &str) -> Option<Value> {
    block.get(name).filter(|v| !v.is_null()).cloned()
}
