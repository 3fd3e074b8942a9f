//! Datetime parsing and the `Y-m-d H:i:s` wire format

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serializer;
use serde_json::Value;
use tracing::debug;

/// Format used by the API for every datetime it emits.
pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a datetime as the API sends it: `Y-m-d H:i:s`, RFC 3339, a bare
/// date, or unix seconds. Naive values are taken as UTC.
pub fn parse(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, WIRE_FORMAT) {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(secs) = text.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    debug!(value = %text, "unrecognized datetime");
    None
}

pub(crate) fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse(s),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

/// `serialize_with` helper emitting [`WIRE_FORMAT`].
pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&dt.format(WIRE_FORMAT))
}

/// `serialize_with` helper emitting unix seconds.
pub fn serialize_timestamp<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(dt.timestamp())
}
