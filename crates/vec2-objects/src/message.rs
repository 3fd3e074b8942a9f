//! Server messages attached to a response
//!
//! Messages are plain records grouped by key (usually the form field they
//! refer to). They are informational; a failed call is signalled by
//! `Response::status`, not by a message.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::fields::Fields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub code: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl Message {
    pub fn new(code: i64, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: kind.into(),
            message: message.into(),
        }
    }

    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        Self::new(f.int_or("code", 0), f.string("type"), f.string("message"))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.code, self.kind, self.message)
    }
}

/// Messages keyed by group, in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageGroup(BTreeMap<String, Vec<Message>>);

impl MessageGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"key": [{"code", "type", "message"}, ...], ...}`. Groups
    /// that are not lists are skipped.
    pub fn from_json(value: &Value) -> Self {
        let groups = value
            .as_object()
            .into_iter()
            .flatten()
            .filter_map(|(key, group)| {
                let list = group.as_array()?;
                Some((key.clone(), list.iter().map(Message::from_json).collect()))
            })
            .collect();
        Self(groups)
    }

    pub fn get(&self, key: &str) -> Option<&[Message]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: impl Into<String>, messages: Vec<Message>) {
        self.0.insert(key.into(), messages);
    }

    pub fn push(&mut self, key: impl Into<String>, message: Message) {
        self.0.entry(key.into()).or_default().push(message);
    }

    /// Total number of messages across all groups.
    pub fn count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Message])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
