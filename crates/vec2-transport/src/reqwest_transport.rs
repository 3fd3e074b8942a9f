//! Network transport backed by `reqwest`.
//!
//! Multipart bodies are encoded by reqwest, which also writes the
//! boundary-qualified `Content-Type`. A caller-supplied bare
//! `multipart/form-data` content type is therefore dropped for multipart
//! bodies and forwarded unchanged for empty ones.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::request::{Body, FilePart, HttpRequest, RawResponse};
use crate::{Error, Result, Transport};

/// Sends requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Per-request timeout applied on top of the client's own policy.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn execute(&self, request: HttpRequest) -> Result<RawResponse> {
        let HttpRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        let mut builder = self.client.request(method.clone(), &url);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        match body {
            Body::Empty => {
                builder = builder.headers(headers);
            }
            Body::Multipart { fields, files } => {
                headers.remove(CONTENT_TYPE);
                let mut form = Form::new();
                for (name, value) in fields.iter() {
                    form = form.text(name.to_owned(), value.to_owned());
                }
                for file in files {
                    let field = file.field.clone();
                    form = form.part(field, file_part(file).await?);
                }
                builder = builder.headers(headers).multipart(form);
            }
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!("{method} {url}: {e}"))
            } else {
                Error::Request(format!("{method} {url}: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Request(format!("reading response body: {e}")))?;

        debug!(%method, %url, status, bytes = body.len(), "response received");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Read an attachment from disk. The upload file name is the field name.
async fn file_part(file: FilePart) -> Result<Part> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| Error::Io(format!("reading attachment {}: {e}", file.path.display())))?;
    Part::bytes(bytes)
        .file_name(file.field)
        .mime_str(&file.content_type)
        .map_err(|e| Error::InvalidBody(format!("content type {}: {e}", file.content_type)))
}

impl Transport for ReqwestTransport {
    fn id(&self) -> &str {
        "reqwest"
    }

    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + '_>> {
        Box::pin(self.execute(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FormData;
    use reqwest::Method;
    use reqwest::header::{HeaderMap, HeaderValue};
    use wiremock::matchers::{body_string_contains, header, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(reqwest::Client::new())
    }

    fn base_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("from", HeaderValue::from_static("client-1:key-1"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data"));
        headers
    }

    #[tokio::test]
    async fn get_forwards_headers_and_returns_raw_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile/bob"))
            .and(query_param("q", "x"))
            .and(header("from", "client-1:key-1"))
            .and(header("content-type", "multipart/form-data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .insert_header("authorization", "Bearer rotated")
                    .set_body_string(r#"{"status":true}"#),
            )
            .mount(&server)
            .await;

        let response = transport()
            .send(HttpRequest {
                method: Method::GET,
                url: format!("{}/profile/bob?q=x", server.uri()),
                headers: base_headers(),
                body: Body::Empty,
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("Authorization"), Some("Bearer rotated"));
        assert_eq!(response.body_text(), r#"{"status":true}"#);
    }

    #[tokio::test]
    async fn non_success_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let response = transport()
            .send(HttpRequest {
                method: Method::GET,
                url: server.uri(),
                headers: HeaderMap::new(),
                body: Body::Empty,
            })
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body_text(), "missing");
    }

    #[tokio::test]
    async fn multipart_body_carries_fields_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("logo.svg");
        std::fs::write(&file_path, "<svg>logo-bytes</svg>").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/vector"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .and(body_string_contains("name=\"title\""))
            .and(body_string_contains("Retro Logo"))
            .and(body_string_contains("name=\"vector\"; filename=\"vector\""))
            .and(body_string_contains("<svg>logo-bytes</svg>"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport()
            .send(HttpRequest {
                method: Method::POST,
                url: format!("{}/user/vector", server.uri()),
                headers: base_headers(),
                body: Body::Multipart {
                    fields: FormData::new().with("title", "Retro Logo"),
                    files: vec![FilePart::new("vector", &file_path, "image/svg+xml")],
                },
            })
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn missing_attachment_is_io_error() {
        let result = transport()
            .send(HttpRequest {
                method: Method::POST,
                url: "http://127.0.0.1:9/unused".into(),
                headers: HeaderMap::new(),
                body: Body::Multipart {
                    fields: FormData::new(),
                    files: vec![FilePart::new("vector", "/nonexistent/file.svg", "image/svg+xml")],
                },
            })
            .await;
        assert!(matches!(result, Err(Error::Io(_))), "got: {result:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let result = transport()
            .send(HttpRequest {
                method: Method::GET,
                url: "http://127.0.0.1:9/".into(),
                headers: HeaderMap::new(),
                body: Body::Empty,
            })
            .await;
        assert!(matches!(result, Err(Error::Request(_))), "got: {result:?}");
    }

    #[test]
    fn id_returns_reqwest() {
        assert_eq!(transport().id(), "reqwest");
    }
}
