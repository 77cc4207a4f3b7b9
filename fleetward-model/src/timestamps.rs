use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Timestamp as trackers actually send it: epoch seconds, epoch millis, or a
/// textual date in one of a handful of layouts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TimestampInput {
    Epoch(i64),
    Text(String),
}

const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// Anything larger is treated as milliseconds.
const EPOCH_SECONDS_CEILING: i64 = 100_000_000_000;

impl TimestampInput {
    /// Interpret the value, or `None` when it is unusable.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            TimestampInput::Epoch(value) if *value > EPOCH_SECONDS_CEILING => {
                Utc.timestamp_millis_opt(*value).single()
            }
            TimestampInput::Epoch(value) => {
                Utc.timestamp_opt(*value, 0).single()
            }
            TimestampInput::Text(raw) => parse_text(raw),
        }
    }

    pub fn resolve_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.parse().unwrap_or(fallback)
    }
}

fn parse_text(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(epoch) = raw.parse::<i64>() {
        return TimestampInput::Epoch(epoch).parse();
    }
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 7, 30, 0).unwrap();
        for input in [
            TimestampInput::Text("2024-03-05T07:30:00Z".into()),
            TimestampInput::Text("2024-03-05 07:30:00".into()),
            TimestampInput::Text("1709623800".into()),
            TimestampInput::Epoch(1_709_623_800),
            TimestampInput::Epoch(1_709_623_800_000),
        ] {
            assert_eq!(input.parse(), Some(expected), "{input:?}");
        }
    }

    #[test]
    fn garbage_falls_back() {
        let fallback = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            TimestampInput::Text("yesterday-ish".into()).resolve_or(fallback),
            fallback
        );
        assert_eq!(TimestampInput::Text("  ".into()).parse(), None);
    }
}
