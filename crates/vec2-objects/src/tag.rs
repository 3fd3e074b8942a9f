use serde::Serialize;
use serde_json::Value;

use crate::FromJson;
use crate::fields::Fields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: Option<i64>,
    pub tag: String,
}

impl FromJson for Tag {
    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        Self {
            id: f.opt_int("id"),
            tag: f.string("tag"),
        }
    }
}
