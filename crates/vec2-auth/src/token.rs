//! Compact signed tokens (HS256 JWS)
//!
//! Wire format: `b64url(header) "." b64url(payload) "." b64url(signature)`,
//! no padding. The header is `{"alg":"HS256","typ":"JWT"}`; the payload holds
//! `iat`, `exp` and string claims. The signature is HMAC-SHA256 over the
//! first two segments joined by a dot.
//!
//! Decoding and verification are separate steps: `decode` only checks the
//! structure, `verify` only checks the signature. Neither looks at `exp`.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::SIGNING_ALGORITHM;
use crate::error::{Error, Result};

/// JOSE header. Unknown header fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: SIGNING_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    #[serde(flatten)]
    claims: BTreeMap<String, Value>,
}

/// A structurally valid token whose signature has not been checked yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToken {
    pub header: TokenHeader,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
    /// Every payload claim except `iat` and `exp`.
    pub claims: BTreeMap<String, Value>,
    signing_input: String,
    signature: String,
}

impl ParsedToken {
    /// Claim value as a string. Non-string JSON values are rendered as JSON;
    /// `null` counts as absent.
    pub fn claim(&self, name: &str) -> Option<String> {
        match self.claims.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Sign `claims` with `iat = now` and `exp = now + ttl_secs`.
pub fn encode(claims: &BTreeMap<String, String>, ttl_secs: u64, secret: &[u8]) -> Result<String> {
    encode_at(claims, unix_now(), ttl_secs, secret)
}

/// Sign `claims` with an explicit issue time.
pub fn encode_at(
    claims: &BTreeMap<String, String>,
    issued_at: i64,
    ttl_secs: u64,
    secret: &[u8],
) -> Result<String> {
    let expires_at = i64::try_from(ttl_secs)
        .ok()
        .and_then(|ttl| issued_at.checked_add(ttl))
        .ok_or_else(|| Error::Signing(format!("ttl out of range: {ttl_secs}s")))?;
    let payload = Payload {
        iat: Some(issued_at),
        exp: Some(expires_at),
        claims: claims
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    };
    let header = serde_json::to_vec(&TokenHeader::default())
        .map_err(|e| Error::Signing(format!("serializing header: {e}")))?;
    let payload = serde_json::to_vec(&payload)
        .map_err(|e| Error::Signing(format!("serializing payload: {e}")))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let signature = jsonwebtoken::crypto::sign(
        signing_input.as_bytes(),
        &EncodingKey::from_secret(secret),
        Algorithm::HS256,
    )
    .map_err(|e| Error::Signing(e.to_string()))?;

    Ok(format!("{signing_input}.{signature}"))
}

/// Split and decode a compact token without checking its signature.
pub fn decode(token: &str) -> Result<ParsedToken> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    let [header_b64, payload_b64, signature] = parts.as_slice() else {
        return Err(Error::MalformedToken(format!(
            "expected 3 dot-separated segments, got {}",
            parts.len()
        )));
    };

    let header: TokenHeader = decode_segment(header_b64, "header")?;
    let mut claims: BTreeMap<String, Value> = decode_segment(payload_b64, "payload")?;
    let issued_at = claims.remove("iat").as_ref().and_then(numeric_date);
    let expires_at = claims.remove("exp").as_ref().and_then(numeric_date);
    URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| Error::MalformedToken(format!("signature is not base64url: {e}")))?;

    Ok(ParsedToken {
        header,
        issued_at,
        expires_at,
        claims,
        signing_input: format!("{header_b64}.{payload_b64}"),
        signature: (*signature).to_string(),
    })
}

/// `iat`/`exp` as whole seconds. Fractional dates are truncated; anything
/// non-numeric counts as absent.
fn numeric_date(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::MalformedToken(format!("{what} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedToken(format!("{what} is not valid JSON: {e}")))
}

/// Recompute the HS256 signature and compare it in constant time.
///
/// Returns false for any other algorithm, including `none`.
pub fn verify(token: &ParsedToken, secret: &[u8]) -> bool {
    if token.header.alg != SIGNING_ALGORITHM {
        return false;
    }
    jsonwebtoken::crypto::verify(
        &token.signature,
        token.signing_input.as_bytes(),
        &DecodingKey::from_secret(secret),
        Algorithm::HS256,
    )
    .unwrap_or(false)
}
