//! vec2 authentication library
//!
//! Provides the signed-token codec, pluggable token persistence, and the
//! auth session that attaches and rotates credentials. This crate has no
//! dependency on the HTTP transport and can be tested on its own.
//!
//! Credential flow:
//! 1. Host redirects the user to the login URL built by the client
//! 2. The API calls back with `?token=...`, a token signed with the app secret
//! 3. `AuthSession::complete_login_callback()` verifies it and stores the
//!    access and refresh tokens via the active `TokenStore`
//! 4. Auth-endpoint calls carry `AuthSession::build_auth_envelope()`
//! 5. A fresh `Authorization` response header goes through
//!    `AuthSession::rotate_from_header()`
//!
//! Token expiry (`exp`) is never checked on this side: a valid signature is
//! the only acceptance criterion. The API is expected to enforce expiry.

pub mod constants;
pub mod credentials;
pub mod error;
pub mod session;
pub mod store;
pub mod token;

pub use constants::*;
pub use credentials::FileStore;
pub use error::{Error, Result};
pub use session::{AuthSession, AuthState, Rotation};
pub use store::{CookieStore, NoopStore, SessionStore, TokenStore, select_store, store_key};
pub use token::{ParsedToken, TokenHeader, decode, encode, verify};
