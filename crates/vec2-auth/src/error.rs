//! Error types for token and credential operations

/// Errors from token codec and token store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
