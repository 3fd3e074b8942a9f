//! Lenient field access over decoded JSON objects
//!
//! The API is loose about scalar types: ids arrive as numbers or strings,
//! flags as `1`, `"1"` or `true`. Every accessor falls back to a default
//! instead of failing, so a partially filled object still maps.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::time;

fn empty() -> &'static Map<String, Value> {
    static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);
    &EMPTY
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    /// View over `value`. Anything other than an object has no fields.
    pub(crate) fn of(value: &'a Value) -> Self {
        Self(value.as_object().unwrap_or_else(|| empty()))
    }

    /// A present, non-null field.
    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn nested(&self, key: &str) -> Fields<'a> {
        self.get(key).map(Fields::of).unwrap_or(Fields(empty()))
    }

    pub(crate) fn string(&self, key: &str) -> String {
        self.opt_string(key).unwrap_or_default()
    }

    pub(crate) fn opt_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_string)
    }

    pub(crate) fn int_or(&self, key: &str, default: i64) -> i64 {
        self.opt_int(key).unwrap_or(default)
    }

    pub(crate) fn opt_int(&self, key: &str) -> Option<i64> {
        self.get(key).map(to_int)
    }

    pub(crate) fn float(&self, key: &str) -> f64 {
        self.get(key).map(to_float).unwrap_or(0.0)
    }

    /// True only when the field is numerically 1.
    pub(crate) fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| to_int(v) == 1)
    }

    /// Parsed datetime, or the current time when absent.
    pub(crate) fn datetime(&self, key: &str) -> DateTime<Utc> {
        self.get(key)
            .and_then(time::parse_value)
            .unwrap_or_else(Utc::now)
    }

    pub(crate) fn array(&self, key: &str) -> &'a [Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Loose integer cast: numbers and numeric text convert, anything else is 0.
fn to_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn to_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}
