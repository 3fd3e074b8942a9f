//! Typed objects for the vec2 API
//!
//! Every endpoint answers with a [`Response`] envelope. Its `data` entries
//! are mapped into the domain types below with lenient defaults: a missing
//! or loosely typed field never fails a mapping.

mod fields;

pub mod customer;
pub mod message;
pub mod payout;
pub mod profile;
pub mod response;
pub mod sale;
pub mod tag;
pub mod time;
pub mod user;
pub mod vector;

pub use customer::Customer;
pub use message::{Message, MessageGroup};
pub use payout::Payout;
pub use profile::Profile;
pub use response::{DataField, Response};
pub use sale::Sale;
pub use tag::Tag;
pub use user::User;
pub use vector::Vector;

use serde_json::Value;

/// Lenient mapping from a decoded JSON value.
pub trait FromJson: Sized {
    fn from_json(value: &Value) -> Self;
}
