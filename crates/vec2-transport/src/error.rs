//! Error types for transport operations

/// Errors raised while sending a request. These are never retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;
