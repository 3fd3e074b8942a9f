//! HTTP transport abstraction for the vec2 client
//!
//! Defines the `Transport` trait that decouples request dispatch from the
//! HTTP stack. `ReqwestTransport` sends requests over the network;
//! `FakeTransport` records requests and replays canned responses so the
//! dispatcher and client can be tested without a server.

pub mod error;
pub mod fake;
pub mod request;
pub mod reqwest_transport;

pub use error::{Error, Result};
pub use fake::FakeTransport;
pub use request::{Body, FilePart, FormData, HttpRequest, RawResponse};
pub use reqwest::Method;
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest_transport::ReqwestTransport;

use std::future::Future;
use std::pin::Pin;

/// Sends a fully built request and returns the raw response.
///
/// The transport owns timeout and connection policy. It never inspects the
/// body or interprets status codes: a 4xx/5xx reply is still `Ok`.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "reqwest", "fake")
    fn id(&self) -> &str;

    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + '_>>;
}
