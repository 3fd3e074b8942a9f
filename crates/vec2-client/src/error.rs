//! Error types for the vec2 client
//!
//! Only conditions the caller cannot act on through a `Response` are
//! errors: transport failures, store write failures, unparseable JSON and
//! invalid configuration. A logically failed call is an `Ok(Response)`
//! with `status == false`.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] vec2_transport::Error),

    #[error(transparent)]
    Auth(#[from] vec2_auth::Error),

    /// The reply declared `application/json` but did not parse.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

pub type Result<T> = std::result::Result<T, Error>;
