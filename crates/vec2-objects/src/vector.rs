//! A listed vector asset

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::FromJson;
use crate::fields::Fields;
use crate::tag::Tag;
use crate::time;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vector {
    pub id: Option<String>,
    pub user: String,
    pub title: String,
    pub is_shared: bool,
    pub price: f64,
    pub tags: Vec<Tag>,
    #[serde(serialize_with = "time::serialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "time::serialize")]
    pub created_at: DateTime<Utc>,
}

impl FromJson for Vector {
    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        Self {
            id: f.opt_string("id"),
            user: f.string("user"),
            title: f.string("title"),
            is_shared: f.flag("is_shared"),
            price: f.float("price"),
            tags: f.array("tags").iter().map(linked_tag).collect(),
            updated_at: f.datetime("updated_at"),
            created_at: f.datetime("created_at"),
        }
    }
}

/// Tags embedded in a vector are join rows: the tag's id is `tag_id`.
fn linked_tag(value: &Value) -> Tag {
    let f = Fields::of(value);
    Tag {
        id: f.opt_int("tag_id"),
        tag: f.string("tag"),
    }
}
