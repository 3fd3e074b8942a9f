//! A purchase or sale record. Both lists share this shape.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::FromJson;
use crate::fields::Fields;
use crate::time;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sale {
    pub id: i64,
    pub user: String,
    pub vector: String,
    pub price: f64,
    pub transaction: String,
    pub status: i64,
    #[serde(serialize_with = "time::serialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "time::serialize")]
    pub created_at: DateTime<Utc>,
}

impl FromJson for Sale {
    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        Self {
            id: f.int_or("id", -1),
            user: f.string("user"),
            vector: f.string("vector"),
            price: f.float("price"),
            transaction: f.string("transaction"),
            status: f.int_or("status", 1),
            updated_at: f.datetime("updated_at"),
            created_at: f.datetime("created_at"),
        }
    }
}
