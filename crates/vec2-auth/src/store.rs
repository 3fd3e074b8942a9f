//! Token persistence backends
//!
//! The auth session mirrors every token change into exactly one
//! `TokenStore`. All backends namespace their keys with `vec2_`.
//!
//! - `NoopStore`: remembers nothing (default)
//! - `SessionStore`: in-memory map; `SessionStore::process()` shares one
//!   map across the whole process, started on first use
//! - `CookieStore`: cookies scoped to a URL with a 24 hour lifetime
//! - `FileStore` (see `credentials`): JSON file on disk

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use reqwest::Url;
use reqwest::cookie::{CookieStore as _, Jar};
use tracing::debug;

use crate::constants::{COOKIE_PATH, COOKIE_TTL_SECS, STORE_KEY_PREFIX};
use crate::error::Result;

/// Full storage key for a token name, e.g. `accessToken` -> `vec2_accessToken`.
pub fn store_key(name: &str) -> String {
    format!("{STORE_KEY_PREFIX}{name}")
}

/// Key-value persistence for the credential pair.
///
/// `read` returns an empty string for unknown keys: callers do not
/// distinguish "never set" from "set to empty".
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn TokenStore>`).
pub trait TokenStore: Send + Sync {
    /// Identifier for logging (e.g. "noop", "session", "cookie", "file")
    fn id(&self) -> &str;

    fn read<'a>(&'a self, name: &'a str) -> Pin<Box<dyn Future<Output = String> + Send + 'a>>;

    fn write<'a>(
        &'a self,
        name: &'a str,
        value: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Pick the active backend. Session storage wins when both are enabled.
pub fn select_store(session: bool, cookie: bool, cookie_url: &Url) -> Arc<dyn TokenStore> {
    if session {
        Arc::new(SessionStore::process())
    } else if cookie {
        Arc::new(CookieStore::new(cookie_url.clone()))
    } else {
        Arc::new(NoopStore)
    }
}

/// Stores nothing. Tokens live only as long as the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl TokenStore for NoopStore {
    fn id(&self) -> &str {
        "noop"
    }

    fn read<'a>(&'a self, _name: &'a str) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(async { String::new() })
    }

    fn write<'a>(
        &'a self,
        _name: &'a str,
        _value: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}

type SessionMap = Arc<Mutex<HashMap<String, String>>>;

static PROCESS_SESSION: OnceLock<SessionMap> = OnceLock::new();

/// In-memory session map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    values: SessionMap,
}

impl SessionStore {
    /// A private session owned by this handle and its clones.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide session. The first call starts it; later calls
    /// attach to the same map.
    pub fn process() -> Self {
        let values = PROCESS_SESSION.get_or_init(|| {
            debug!("starting process session");
            SessionMap::default()
        });
        Self {
            values: Arc::clone(values),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: String, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_owned());
    }
}

impl TokenStore for SessionStore {
    fn id(&self) -> &str {
        "session"
    }

    fn read<'a>(&'a self, name: &'a str) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        let value = self.get(&store_key(name)).unwrap_or_default();
        Box::pin(async move { value })
    }

    fn write<'a>(
        &'a self,
        name: &'a str,
        value: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        self.set(store_key(name), value);
        Box::pin(async { Ok(()) })
    }
}

/// Cookie-backed store scoped to `url` with path `/` and a 24 hour max-age.
///
/// The jar can be shared with a `reqwest::Client` (`cookie_provider`) or read
/// back with `cookie_header()` when the host forwards cookies elsewhere.
#[derive(Debug, Clone)]
pub struct CookieStore {
    jar: Arc<Jar>,
    url: Url,
}

impl CookieStore {
    pub fn new(url: Url) -> Self {
        Self::with_jar(Arc::new(Jar::default()), url)
    }

    pub fn with_jar(jar: Arc<Jar>, url: Url) -> Self {
        Self { jar, url }
    }

    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// The `Cookie` header value the jar would send to the scoped URL.
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.url)
            .and_then(|v| v.to_str().ok().map(str::to_owned))
    }

    fn get(&self, key: &str) -> Option<String> {
        let header = self.cookie_header()?;
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == key).then(|| value.to_owned())
        })
    }
}

impl TokenStore for CookieStore {
    fn id(&self) -> &str {
        "cookie"
    }

    fn read<'a>(&'a self, name: &'a str) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        let value = self.get(&store_key(name)).unwrap_or_default();
        Box::pin(async move { value })
    }

    fn write<'a>(
        &'a self,
        name: &'a str,
        value: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let cookie = format!(
            "{}={value}; Max-Age={COOKIE_TTL_SECS}; Path={COOKIE_PATH}",
            store_key(name)
        );
        self.jar.add_cookie_str(&cookie, &self.url);
        Box::pin(async { Ok(()) })
    }
}
