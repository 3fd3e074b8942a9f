//! The uniform response envelope returned by every endpoint
//!
//! Wire shape: `{"status": bool, "time": <datetime>, "data": {...}}` with
//! server messages under `data.messages`. Data entries start out as raw
//! JSON and are replaced by typed values as endpoints map them.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::FromJson;
use crate::customer::Customer;
use crate::message::MessageGroup;
use crate::payout::Payout;
use crate::profile::Profile;
use crate::sale::Sale;
use crate::tag::Tag;
use crate::time;
use crate::user::User;
use crate::vector::Vector;

/// Key under `data` that carries server messages.
pub const MESSAGES_KEY: &str = "messages";

/// One entry of `Response::data`.
///
/// Serializes untagged: each variant has the same JSON shape as the
/// payload it was mapped from. `File` bytes are emitted as base64.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataField {
    Profile(Profile),
    Profiles(Vec<Profile>),
    User(User),
    Vector(Vector),
    Vectors(Vec<Vector>),
    Tags(Vec<Tag>),
    Customer(Customer),
    Sales(Vec<Sale>),
    Payouts(Vec<Payout>),
    File(#[serde(serialize_with = "serialize_base64")] Bytes),
    Raw(Value),
}

fn serialize_base64<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

impl DataField {
    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            DataField::Raw(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&Bytes> {
        match self {
            DataField::File(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            DataField::Profile(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_profiles(&self) -> Option<&[Profile]> {
        match self {
            DataField::Profiles(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            DataField::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            DataField::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vectors(&self) -> Option<&[Vector]> {
        match self {
            DataField::Vectors(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&[Tag]> {
        match self {
            DataField::Tags(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            DataField::Customer(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_sales(&self) -> Option<&[Sale]> {
        match self {
            DataField::Sales(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_payouts(&self) -> Option<&[Payout]> {
        match self {
            DataField::Payouts(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: bool,
    #[serde(serialize_with = "time::serialize_timestamp")]
    pub time: DateTime<Utc>,
    pub data: BTreeMap<String, DataField>,
    pub messages: MessageGroup,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Response {
    pub fn new(status: bool) -> Self {
        Self {
            status,
            time: Utc::now(),
            data: BTreeMap::new(),
            messages: MessageGroup::new(),
        }
    }

    /// A local failure with no data, e.g. when a rotated token fails verification.
    pub fn failed() -> Self {
        Self::new(false)
    }

    /// Build from a decoded JSON reply.
    ///
    /// Missing `status` is false and missing `time` is now. Anything under
    /// `data` except `messages` is kept as raw JSON; `data.messages` is
    /// parsed into the message group.
    pub fn from_json(value: &Value) -> Self {
        let status = value.get("status").is_some_and(truthy);
        let time = value
            .get("time")
            .and_then(time::parse_value)
            .unwrap_or_else(Utc::now);

        let mut response = Self {
            status,
            time,
            ..Self::default()
        };

        if let Some(data) = value.get("data").and_then(Value::as_object) {
            for (key, entry) in data {
                if key == MESSAGES_KEY {
                    response.messages = MessageGroup::from_json(entry);
                } else {
                    response.data.insert(key.clone(), DataField::Raw(entry.clone()));
                }
            }
        }
        response
    }

    pub fn get(&self, key: &str) -> Option<&DataField> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, field: DataField) {
        self.data.insert(key.into(), field);
    }

    /// Replace the raw object under `key` with its typed form. A missing
    /// or non-object entry is left as it was.
    pub fn map_object<T: FromJson>(&mut self, key: &str, wrap: fn(T) -> DataField) {
        let Some(DataField::Raw(raw)) = self.data.get(key) else {
            warn!(key, "expected object missing from response data");
            return;
        };
        if !raw.is_object() {
            warn!(key, "response data entry is not an object");
            return;
        }
        let mapped = wrap(T::from_json(raw));
        self.data.insert(key.to_owned(), mapped);
    }

    /// Replace the raw list under `key` with its typed elements. A missing
    /// or non-list entry is left as it was.
    pub fn map_list<T: FromJson>(&mut self, key: &str, wrap: fn(Vec<T>) -> DataField) {
        let Some(DataField::Raw(raw)) = self.data.get(key) else {
            warn!(key, "expected list missing from response data");
            return;
        };
        let Some(items) = raw.as_array() else {
            warn!(key, "response data entry is not a list");
            return;
        };
        let mapped = wrap(items.iter().map(T::from_json).collect());
        self.data.insert(key.to_owned(), mapped);
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.get("profile").and_then(DataField::as_profile)
    }

    pub fn user(&self) -> Option<&User> {
        self.get("user").and_then(DataField::as_user)
    }

    pub fn vector(&self) -> Option<&Vector> {
        self.get("vector").and_then(DataField::as_vector)
    }

    pub fn vectors(&self) -> Option<&[Vector]> {
        self.get("vectors").and_then(DataField::as_vectors)
    }
}

impl From<&Value> for Response {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

/// Loose truthiness for `status`: `true`, non-zero numbers, and non-empty
/// strings other than `"0"`.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}
