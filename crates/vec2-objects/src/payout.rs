use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::FromJson;
use crate::fields::Fields;
use crate::time;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payout {
    pub id: i64,
    pub user: String,
    pub paypal: String,
    pub amount: f64,
    pub completed: bool,
    #[serde(serialize_with = "time::serialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "time::serialize")]
    pub created_at: DateTime<Utc>,
}

impl FromJson for Payout {
    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        Self {
            id: f.int_or("id", -1),
            user: f.string("user"),
            paypal: f.string("paypal"),
            amount: f.float("amount"),
            completed: f.flag("completed"),
            updated_at: f.datetime("updated_at"),
            created_at: f.datetime("created_at"),
        }
    }
}
