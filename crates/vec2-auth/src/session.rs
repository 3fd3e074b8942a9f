//! Auth session: owns the credential pair and drives the login/rotation
//! state machine.
//!
//! ```text
//! Anonymous --(callback token with valid signature)--> Authenticated
//! Authenticated --(rotated header with valid signature)--> Authenticated (access replaced)
//! Authenticated --(header fails decode/verify)--> Authenticated (unchanged, call flagged)
//! ```
//!
//! Tokens are cached in memory and written through to the `TokenStore` on
//! every change. A field is read back from the store only while its
//! in-memory value is unset.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use common::Secret;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::{ACCESS_TOKEN_KEY, ENVELOPE_TTL_SECS, REFRESH_TOKEN_KEY};
use crate::error::Result;
use crate::store::TokenStore;
use crate::token::{self, ParsedToken};

/// Outcome of inspecting an `Authorization` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Signature verified; the access token was replaced.
    Rotated,
    /// The header did not decode or verify. Possible man-in-the-middle; the
    /// caller must fail this one response. Session state is unchanged.
    Tampered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

#[derive(Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

pub struct AuthSession {
    secret: Secret<String>,
    store: Arc<dyn TokenStore>,
    tokens: Mutex<Tokens>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("secret", &self.secret)
            .field("store", &self.store.id())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    pub fn new(secret: Secret<String>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            secret,
            store,
            tokens: Mutex::new(Tokens::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub async fn set_access_token(&self, token: &str) -> Result<()> {
        self.store.write(ACCESS_TOKEN_KEY, token).await?;
        self.tokens.lock().await.access = Some(token.to_owned());
        Ok(())
    }

    pub async fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.store.write(REFRESH_TOKEN_KEY, token).await?;
        self.tokens.lock().await.refresh = Some(token.to_owned());
        Ok(())
    }

    /// Current access token, hydrated from the store on first use. Empty when unset.
    pub async fn access_token(&self) -> String {
        let mut tokens = self.tokens.lock().await;
        if tokens.access.is_none() {
            tokens.access = Some(self.store.read(ACCESS_TOKEN_KEY).await);
        }
        tokens.access.clone().unwrap_or_default()
    }

    /// Current refresh token, hydrated from the store on first use. Empty when unset.
    pub async fn refresh_token(&self) -> String {
        let mut tokens = self.tokens.lock().await;
        if tokens.refresh.is_none() {
            tokens.refresh = Some(self.store.read(REFRESH_TOKEN_KEY).await);
        }
        tokens.refresh.clone().unwrap_or_default()
    }

    pub async fn state(&self) -> AuthState {
        if self.access_token().await.is_empty() || self.refresh_token().await.is_empty() {
            AuthState::Anonymous
        } else {
            AuthState::Authenticated
        }
    }

    /// Decode and verify a token against the application secret.
    fn verified(&self, raw: &str) -> Option<ParsedToken> {
        match token::decode(raw) {
            Ok(parsed) if token::verify(&parsed, self.secret.expose_bytes()) => Some(parsed),
            Ok(_) => {
                debug!("token signature did not verify");
                None
            }
            Err(e) => {
                debug!(error = %e, "token did not decode");
                None
            }
        }
    }

    /// Handle the `token` parameter of the login callback.
    ///
    /// A token that does not decode, does not verify, or lacks either claim
    /// is ignored and the session stays as it was. Returns whether the
    /// credentials were accepted.
    pub async fn complete_login_callback(&self, raw: &str) -> Result<bool> {
        let Some(parsed) = self.verified(raw) else {
            return Ok(false);
        };
        let (Some(access), Some(refresh)) = (
            parsed.claim(ACCESS_TOKEN_KEY),
            parsed.claim(REFRESH_TOKEN_KEY),
        ) else {
            debug!("callback token is missing a credential claim");
            return Ok(false);
        };

        self.set_access_token(&access).await?;
        self.set_refresh_token(&refresh).await?;
        info!(store = self.store.id(), "login callback accepted");
        Ok(true)
    }

    /// Signed envelope proving possession of both tokens, or `None` while
    /// either token is empty.
    pub async fn build_auth_envelope(&self) -> Result<Option<String>> {
        let refresh = self.refresh_token().await;
        let access = self.access_token().await;
        if refresh.is_empty() || access.is_empty() {
            return Ok(None);
        }

        let claims = BTreeMap::from([
            (REFRESH_TOKEN_KEY.to_string(), refresh),
            (ACCESS_TOKEN_KEY.to_string(), access),
        ]);
        token::encode(&claims, ENVELOPE_TTL_SECS, self.secret.expose_bytes()).map(Some)
    }

    /// Adopt a server-rotated access token from an `Authorization` header.
    ///
    /// The refresh token is kept. Nothing changes unless the header's token
    /// verifies and carries an `accessToken` claim.
    pub async fn rotate_from_header(&self, header_value: &str) -> Result<Rotation> {
        let raw = strip_bearer(header_value);
        let access = self
            .verified(raw)
            .and_then(|parsed| parsed.claim(ACCESS_TOKEN_KEY));
        let Some(access) = access else {
            warn!("rotated authorization header failed verification");
            return Ok(Rotation::Tampered);
        };

        // Rewritten so a store that lost the refresh token mirrors memory again.
        let refresh = self.refresh_token().await;
        self.set_refresh_token(&refresh).await?;
        self.set_access_token(&access).await?;
        debug!("access token rotated");
        Ok(Rotation::Rotated)
    }
}

/// Remove a leading `Bearer` scheme and any whitespace after it.
fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix("Bearer")
        .map(str::trim_start)
        .unwrap_or(value)
}
