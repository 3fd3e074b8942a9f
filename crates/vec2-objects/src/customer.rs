//! Stored payment card summary

use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::FromJson;
use crate::fields::Fields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub exp_month: i64,
    pub exp_year: i64,
    pub last4: String,
}

impl FromJson for Customer {
    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        Self {
            id: f.string("id"),
            name: f.string("name"),
            exp_month: f.int_or("exp_month", 1),
            exp_year: f.int_or("exp_year", i64::from(Utc::now().year())),
            last4: f.string("last4"),
        }
    }
}
