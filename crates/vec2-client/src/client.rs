//! The vec2 client handle
//!
//! ```no_run
//! # async fn demo() -> vec2_client::Result<()> {
//! use vec2_client::Vec2Client;
//!
//! let client = Vec2Client::builder("client-id", "app-secret", "app-key")
//!     .enable_session_storage()
//!     .build()?;
//!
//! let profile = client.get().profile("bob").await?;
//! let liked = client.post().like("17").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Each verb selector returns a fresh [`Call`]; nothing about the verb is
//! remembered between calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use tracing::debug;
use url::Url;
use vec2_auth::{AuthSession, AuthState, DEFAULT_API_URL, TokenStore, select_store};
use vec2_transport::{FilePart, FormData, Method, ReqwestTransport, Transport};

use crate::dispatcher::Dispatcher;
use crate::endpoints::Call;
use crate::error::{Error, Result};
use crate::log::FileLog;
use crate::urls::{build_url, parse_base};

pub struct Vec2ClientBuilder {
    client_id: String,
    secret: Secret<String>,
    key: String,
    url: String,
    session_storage: bool,
    cookie_storage: bool,
    token_store: Option<Arc<dyn TokenStore>>,
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
    logs: Vec<FileLog>,
}

impl Vec2ClientBuilder {
    /// API base URL. Defaults to the public vec2 API.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Persist tokens in the process-wide session. Takes precedence over
    /// cookie storage.
    pub fn enable_session_storage(mut self) -> Self {
        self.session_storage = true;
        self
    }

    /// Persist tokens as cookies scoped to the API URL.
    pub fn enable_cookie_storage(mut self) -> Self {
        self.cookie_storage = true;
        self
    }

    /// Use a specific token store, ignoring the session/cookie switches.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Replace the network transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Per-request timeout for the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a request log. Several logs may be active at once.
    pub fn enable_log(mut self, log: FileLog) -> Self {
        self.logs.push(log);
        self
    }

    pub fn build(self) -> Result<Vec2Client> {
        let base_url = parse_base(&self.url)?;

        let store = match self.token_store {
            Some(store) => store,
            None => select_store(self.session_storage, self.cookie_storage, &base_url),
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut transport = ReqwestTransport::new(reqwest::Client::new());
                if let Some(timeout) = self.timeout {
                    transport = transport.with_timeout(timeout);
                }
                Arc::new(transport)
            }
        };
        debug!(
            url = %base_url,
            store = store.id(),
            transport = transport.id(),
            logs = self.logs.len(),
            "building vec2 client"
        );

        let auth = AuthSession::new(self.secret, store);
        let dispatcher = Dispatcher::new(
            base_url,
            &self.client_id,
            &self.key,
            transport,
            auth,
            self.logs,
        )?;

        Ok(Vec2Client {
            client_id: self.client_id,
            key: self.key,
            dispatcher,
        })
    }
}

pub struct Vec2Client {
    client_id: String,
    key: String,
    pub(crate) dispatcher: Dispatcher,
}

impl Vec2Client {
    pub fn builder(
        client_id: impl Into<String>,
        secret: impl Into<Secret<String>>,
        key: impl Into<String>,
    ) -> Vec2ClientBuilder {
        Vec2ClientBuilder {
            client_id: client_id.into(),
            secret: secret.into(),
            key: key.into(),
            url: DEFAULT_API_URL.to_string(),
            session_storage: false,
            cookie_storage: false,
            token_store: None,
            transport: None,
            timeout: None,
            logs: Vec::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn base_url(&self) -> &Url {
        self.dispatcher.base_url()
    }

    pub fn get(&self) -> Call<'_> {
        Call::new(self, Method::GET)
    }

    pub fn post(&self) -> Call<'_> {
        Call::new(self, Method::POST)
    }

    pub fn patch(&self) -> Call<'_> {
        Call::new(self, Method::PATCH)
    }

    pub fn delete(&self) -> Call<'_> {
        Call::new(self, Method::DELETE)
    }

    /// Attach a file to the next request that carries a body. The file is
    /// read when that request is sent.
    pub fn file(
        &self,
        field: impl Into<String>,
        path: impl Into<PathBuf>,
        content_type: impl Into<String>,
    ) -> &Self {
        self.dispatcher
            .attach(FilePart::new(field, path, content_type));
        self
    }

    pub fn auth(&self) -> &AuthSession {
        self.dispatcher.auth()
    }

    pub async fn access_token(&self) -> String {
        self.auth().access_token().await
    }

    pub async fn refresh_token(&self) -> String {
        self.auth().refresh_token().await
    }

    pub async fn set_access_token(&self, token: &str) -> Result<()> {
        Ok(self.auth().set_access_token(token).await?)
    }

    pub async fn set_refresh_token(&self, token: &str) -> Result<()> {
        Ok(self.auth().set_refresh_token(token).await?)
    }

    pub async fn state(&self) -> AuthState {
        self.auth().state().await
    }

    /// Where to send the user to sign in. After login the API redirects to
    /// `redirect` with a `token` query parameter for
    /// [`complete_login_callback`](Self::complete_login_callback).
    pub fn login_url(&self, redirect: &str) -> Result<Url> {
        let query = FormData::new()
            .with("client", self.client_id.as_str())
            .with("key", self.key.as_str())
            .with("redirect", redirect);
        build_url(self.base_url(), &["authenticate", "try"], &query)
    }

    /// Accept the `token` parameter of the login redirect. Invalid tokens
    /// are ignored; returns whether the session is now logged in.
    pub async fn complete_login_callback(&self, token: &str) -> Result<bool> {
        self.auth()
            .complete_login_callback(token)
            .await
            .map_err(Error::from)
    }
}
