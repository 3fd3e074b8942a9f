//! Client SDK for the vec2 marketplace API
//!
//! ```text
//! Vec2Client --(get/post/patch/delete)--> Call --(endpoint)--> Dispatcher
//!   Dispatcher --> AuthSession (envelope) --> Transport --> AuthSession (rotation)
//!              --> FileLog(s) --> Payload --> Response (typed data)
//! ```
//!
//! - `client`: builder and handle, token accessors, login URL and callback
//! - `endpoints`: one method per API resource on [`Call`]
//! - `dispatcher`: request construction, credential attachment, rotation
//! - `log`: fixed-width request log files
//! - `urls`: endpoint URL construction

pub mod client;
pub mod dispatcher;
pub mod endpoints;
pub mod error;
pub mod log;
pub mod metrics;
pub mod urls;

pub use client::{Vec2Client, Vec2ClientBuilder};
pub use dispatcher::Payload;
pub use endpoints::Call;
pub use error::{Error, Result};
pub use log::{FileLog, LogField, LogParams, LogPredicate};

pub use vec2_auth::{AuthState, FileStore, TokenStore};
pub use vec2_objects as objects;
pub use vec2_transport::{FormData, Method};
