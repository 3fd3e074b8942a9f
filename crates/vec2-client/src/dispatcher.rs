//! Request dispatch
//!
//! Builds each outbound request, attaches credentials for auth endpoints,
//! sends it, and runs the reply back through token rotation, the request
//! logs and content-type decoding:
//!
//! 1. URL from the base and path segments
//! 2. GET with data: data moves to the query string, body stays empty
//! 3. Otherwise pending file attachments join the multipart body (one-shot)
//! 4. `From: <client>:<key>` and `Content-Type: multipart/form-data`
//! 5. Auth endpoint with both tokens: `Authorization: Bearer <envelope>`
//! 6. Send
//! 7. Auth endpoint reply carrying `Authorization`: rotate, or stop with
//!    `Payload::Tampered` when it does not verify
//! 8. Every matching log records the exchange
//! 9. `application/json` is parsed; anything else is returned raw

use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, FROM, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use tracing::{Span, debug, instrument, warn};
use url::Url;
use vec2_auth::{AuthSession, Rotation};
use vec2_transport::{Body, FilePart, FormData, HttpRequest, Method, RawResponse, Transport};

use crate::error::{Error, Result};
use crate::log::{FileLog, LogParams};
use crate::metrics;
use crate::urls::build_url;

/// Content type that marks a reply as structured.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type sent on every request.
pub const REQUEST_CONTENT_TYPE: &str = "multipart/form-data";

/// Decoded reply body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `application/json` reply, parsed.
    Json(Value),
    /// Any other content type, body untouched.
    Raw(Bytes),
    /// A rotated `Authorization` header failed verification. The session
    /// is unchanged and the call must be treated as failed.
    Tampered,
}

pub struct Dispatcher {
    base_url: Url,
    headers: HeaderMap,
    transport: Arc<dyn Transport>,
    auth: AuthSession,
    logs: Vec<FileLog>,
    pending_files: Mutex<Vec<FilePart>>,
}

impl Dispatcher {
    pub fn new(
        base_url: Url,
        client_id: &str,
        key: &str,
        transport: Arc<dyn Transport>,
        auth: AuthSession,
        logs: Vec<FileLog>,
    ) -> Result<Self> {
        let from = HeaderValue::from_str(&format!("{client_id}:{key}"))
            .map_err(|e| Error::InvalidHeader(format!("From: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(FROM, from);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(REQUEST_CONTENT_TYPE));

        Ok(Self {
            base_url,
            headers,
            transport,
            auth,
            logs,
            pending_files: Mutex::new(Vec::new()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Queue a file for the next request that carries a body. A second
    /// file under the same field replaces the first.
    pub fn attach(&self, file: FilePart) {
        let mut pending = self
            .pending_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.retain(|f| f.field != file.field);
        pending.push(file);
    }

    pub fn pending_file_count(&self) -> usize {
        self.pending_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn take_pending_files(&self) -> Vec<FilePart> {
        std::mem::take(
            &mut *self
                .pending_files
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    #[instrument(
        skip_all,
        fields(request_id = %new_request_id(), method = %method, url = tracing::field::Empty, auth = auth_endpoint)
    )]
    pub async fn dispatch(
        &self,
        method: Method,
        segments: &[&str],
        data: FormData,
        auth_endpoint: bool,
    ) -> Result<Payload> {
        let (url, body, logged_data) = if method == Method::GET && !data.is_empty() {
            let url = build_url(&self.base_url, segments, &data)?;
            (url, Body::Empty, Value::Array(Vec::new()))
        } else {
            let url = build_url(&self.base_url, segments, &FormData::new())?;
            let files = self.take_pending_files();
            let logged = logged_body(&data, &files);
            let body = if data.is_empty() && files.is_empty() {
                Body::Empty
            } else {
                Body::Multipart {
                    fields: data,
                    files,
                }
            };
            (url, body, logged)
        };
        let url = url.to_string();
        Span::current().record("url", url.as_str());

        let mut headers = self.headers.clone();
        if auth_endpoint {
            if let Some(envelope) = self.auth.build_auth_envelope().await? {
                let value = HeaderValue::from_str(&format!("Bearer {envelope}"))
                    .map_err(|e| Error::InvalidHeader(format!("Authorization: {e}")))?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        let request = HttpRequest {
            method: method.clone(),
            url: url.clone(),
            headers,
            body,
        };
        let response = self.transport.send(request).await?;
        metrics::record_request(method.as_str(), response.status);
        debug!(status = response.status, transport = self.transport.id(), "reply received");

        if auth_endpoint {
            if let Some(header) = response.header(AUTHORIZATION.as_str()) {
                match self.auth.rotate_from_header(header).await? {
                    Rotation::Rotated => metrics::record_rotation("rotated"),
                    Rotation::Tampered => {
                        metrics::record_rotation("tampered");
                        warn!("rejecting reply with unverifiable authorization header");
                        return Ok(Payload::Tampered);
                    }
                }
            }
        }

        self.write_logs(&method, &url, logged_data, auth_endpoint, &response)
            .await;

        decode(response)
    }

    async fn write_logs(
        &self,
        method: &Method,
        url: &str,
        data: Value,
        auth_endpoint: bool,
        response: &RawResponse,
    ) {
        let mut params: Option<LogParams> = None;
        for log in &self.logs {
            if !log.matches(method, url, &data, auth_endpoint) {
                continue;
            }
            let params = params.get_or_insert_with(|| LogParams {
                data: data.clone(),
                headers: headers_json(&response.headers),
                response: response.body_text(),
            });
            if let Err(e) = log.log(method, url, params).await {
                warn!(path = %log.path().display(), error = %e, "failed to write request log");
            }
        }
    }
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

/// Parse the body when the reply declares exactly `application/json`.
fn decode(response: RawResponse) -> Result<Payload> {
    if response.content_type() == Some(JSON_CONTENT_TYPE) {
        serde_json::from_slice(&response.body)
            .map(Payload::Json)
            .map_err(|e| Error::MalformedResponse(format!("status {}: {e}", response.status)))
    } else {
        Ok(Payload::Raw(response.body))
    }
}

/// Request data as seen by log predicates and rows. Attachments are listed
/// under their field name.
fn logged_body(data: &FormData, files: &[FilePart]) -> Value {
    if data.is_empty() && files.is_empty() {
        return Value::Array(Vec::new());
    }
    let mut map: Map<String, Value> = data
        .iter()
        .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
        .collect();
    for file in files {
        map.insert(
            file.field.clone(),
            serde_json::json!({
                "name": file.path.display().to_string(),
                "mime": file.content_type,
                "postname": file.field,
            }),
        );
    }
    Value::Object(map)
}

fn headers_json(headers: &HeaderMap) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Value::Object(map)
}
