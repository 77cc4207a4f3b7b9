use chrono::{DateTime, Utc};
use fleetward_model::TimestampInput;
use serde_json::Value;

use super::{TrackerUnit, TrackingError};

/// Accepts a bare list, `{"units": [...]}` or `{"data": {"units": [...]}}`.
/// Entries without a usable plate are skipped.
pub fn parse_units(body: &Value) -> Result<Vec<TrackerUnit>, TrackingError> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("data")
            .and_then(|data| data.get("units"))
            .or_else(|| map.get("units"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                TrackingError::Parse("response has no units list".to_string())
            })?,
        other => {
            return Err(TrackingError::Parse(format!(
                "unexpected response shape: {}",
                json_kind(other)
            )));
        }
    };

    Ok(list.iter().filter_map(parse_unit).collect())
}

pub fn parse_unit(raw: &Value) -> Option<TrackerUnit> {
    let plate = first_string(raw, &["number", "plate", "plate_number", "name"])?;
    let plate = plate.trim().to_string();
    if plate.is_empty() {
        return None;
    }

    Some(TrackerUnit {
        plate,
        latitude: number(raw.get("lat")),
        longitude: number(raw.get("lng")),
        direction: number(raw.get("direction")),
        speed: number(raw.get("speed")),
        movement_state: raw
            .get("movement_state")
            .and_then(named)
            .filter(|label| !label.is_empty()),
        last_update: raw.get("last_update").and_then(timestamp),
        device_id: first_string(raw, &["box_id", "device_id", "unit_id"]),
    })
}

/// Numbers may arrive as JSON numbers or numeric strings. Anything else,
/// including non-finite values, reads as absent.
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// `{"name": "moving"}` or a bare string.
fn named(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let input = match value {
        Value::Number(n) => TimestampInput::Epoch(n.as_i64()?),
        Value::String(s) => TimestampInput::Text(s.clone()),
        _ => return None,
    };
    input.parse()
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn reads_nested_units_with_string_numbers() {
        let body = json!({
            "data": {
                "units": [{
                    "number": " KDA 123A ",
                    "lat": "-1.2921",
                    "lng": 36.8219,
                    "direction": "not-a-number",
                    "speed": "42.5",
                    "movement_state": { "name": "moving" },
                    "last_update": "2024-03-05T07:30:00Z",
                    "box_id": 9001
                }]
            }
        });

        let units = parse_units(&body).unwrap();
        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.plate, "KDA 123A");
        assert_eq!(unit.latitude, Some(-1.2921));
        assert_eq!(unit.longitude, Some(36.8219));
        assert_eq!(unit.direction, None);
        assert_eq!(unit.speed, Some(42.5));
        assert_eq!(unit.movement_state.as_deref(), Some("moving"));
        assert_eq!(
            unit.last_update,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 7, 30, 0).unwrap())
        );
        assert_eq!(unit.device_id.as_deref(), Some("9001"));
    }

    #[test]
    fn accepts_bare_list_and_top_level_units() {
        let bare = json!([{ "number": "KDA 1" }, { "lat": 1.0 }]);
        let units = parse_units(&bare).unwrap();
        assert_eq!(units.len(), 1, "unit without plate is skipped");
        assert_eq!(units[0].latitude, None);

        let wrapped = json!({ "units": [{ "number": "KDA 2" }] });
        assert_eq!(parse_units(&wrapped).unwrap()[0].plate, "KDA 2");
    }

    #[test]
    fn rejects_unrecognised_shapes() {
        assert!(matches!(
            parse_units(&json!({ "error": "nope" })),
            Err(TrackingError::Parse(_))
        ));
        assert!(matches!(
            parse_units(&json!("units")),
            Err(TrackingError::Parse(_))
        ));
    }
}
