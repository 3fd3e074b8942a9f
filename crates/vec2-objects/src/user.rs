//! The signed-in user's account

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::FromJson;
use crate::fields::Fields;
use crate::time;

/// Metadata keys the identity provider stores profile names under.
pub const USERNAME_META_KEY: &str = "username";
pub const FIRSTNAME_META_KEY: &str = "first_name";
pub const LASTNAME_META_KEY: &str = "last_name";

/// Account record. Names and billing ids live in `user_metadata` on the
/// wire, the creation date in `db.created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub email_verified: bool,
    pub customer_id: String,
    pub paypal: String,
    #[serde(serialize_with = "time::serialize")]
    pub created_at: DateTime<Utc>,
}

impl FromJson for User {
    fn from_json(value: &Value) -> Self {
        let f = Fields::of(value);
        let meta = f.nested("user_metadata");
        Self {
            user_id: f.string("sub"),
            username: meta.string(USERNAME_META_KEY),
            first_name: meta.string(FIRSTNAME_META_KEY),
            last_name: meta.string(LASTNAME_META_KEY),
            email: f.string("email"),
            email_verified: f.flag("email_verified"),
            customer_id: meta.string("customer_id"),
            paypal: meta.string("paypal"),
            created_at: f.nested("db").datetime("created_at"),
        }
    }
}
