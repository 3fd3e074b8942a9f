//! Public profile of a marketplace member

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::FromJson;
use crate::fields::Fields;
use crate::time;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(serialize_with = "time::serialize")]
    pub created_at: DateTime<Utc>,
}

impl FromJson for Profile {
    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        Self {
            username: f.string("username"),
            first_name: f.string("first_name"),
            last_name: f.string("last_name"),
            created_at: f.datetime("created_at"),
        }
    }
}
