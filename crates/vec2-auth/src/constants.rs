//! vec2 API constants
//!
//! Public client protocol values. None of these are secrets; the
//! application secret and the tokens themselves are held elsewhere.

/// Production API root
pub const DEFAULT_API_URL: &str = "https://api.vec2.design";

/// Prefix for every key written to a token store
pub const STORE_KEY_PREFIX: &str = "vec2_";

/// Store key and token claim holding the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Store key and token claim holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Lifetime of the client-built bearer envelope
pub const ENVELOPE_TTL_SECS: u64 = 3600;

/// Lifetime of token cookies
pub const COOKIE_TTL_SECS: u64 = 24 * 3600;

/// Path scope of token cookies
pub const COOKIE_PATH: &str = "/";

/// The only signing algorithm accepted or produced
pub const SIGNING_ALGORITHM: &str = "HS256";
