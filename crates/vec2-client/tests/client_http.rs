//! End-to-end client tests against a local mock API.
//!
//! Use `set_body_raw(bytes, mime)` so the reply's Content-Type is exactly
//! what the test states; the client only parses `application/json`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};
use vec2_auth::FileStore;
use vec2_client::{FileLog, FormData, LogField, Vec2Client};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "app-secret";

fn json_reply(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string().into_bytes(), "application/json")
}

fn signed(claims: &[(&str, &str)], secret: &str) -> String {
    let claims: BTreeMap<String, String> = claims
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vec2_auth::encode(&claims, 3600, secret.as_bytes()).unwrap()
}

async fn file_backed_client(server: &MockServer, dir: &tempfile::TempDir) -> (Vec2Client, Arc<FileStore>) {
    let store = Arc::new(
        FileStore::load(dir.path().join("credentials.json"))
            .await
            .unwrap(),
    );
    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap();
    (client, store)
}

#[tokio::test]
async fn public_profile_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile/bob"))
        .and(header("from", "client-1:key-1"))
        .respond_with(json_reply(
            200,
            json!({
                "status": true,
                "time": "2019-06-01 08:00:00",
                "data": {"profile": {
                    "username": "bob",
                    "first_name": "Bob",
                    "last_name": "Stone",
                    "created_at": "2018-01-01 00:00:00"
                }}
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .build()
        .unwrap();
    let resp = client.get().profile("bob").await.unwrap();

    assert!(resp.status);
    assert_eq!(resp.profile().unwrap().last_name, "Stone");
    let rendered = serde_json::to_value(&resp).unwrap();
    assert_eq!(rendered["data"]["profile"]["created_at"], "2018-01-01 00:00:00");
    assert_eq!(rendered["time"], 1_559_376_000);
}

#[tokio::test]
async fn get_data_travels_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/customer"))
        .and(query_param("expand", "card"))
        .respond_with(json_reply(
            200,
            json!({"status": true, "data": {"customer": {"id": "cus_1"}}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .build()
        .unwrap();
    let resp = client
        .get()
        .customer(FormData::new().with("expand", "card"))
        .await
        .unwrap();
    assert_eq!(
        resp.get("customer").unwrap().as_customer().unwrap().id,
        "cus_1"
    );
}

#[tokio::test]
async fn login_then_rotation_persists_new_access_token() {
    let server = MockServer::start().await;
    let rotated = signed(&[("accessToken", "at_2")], SECRET);
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header_exists("authorization"))
        .respond_with(
            json_reply(
                200,
                json!({"status": true, "data": {"user": {
                    "sub": "auth0|1",
                    "user_metadata": {"username": "bob"},
                    "db": {"created_at": "2018-01-01 00:00:00"}
                }}}),
            )
            .insert_header("Authorization", format!("Bearer {rotated}").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, _store) = file_backed_client(&server, &dir).await;
    let callback = signed(&[("accessToken", "at_1"), ("refreshToken", "rt_1")], SECRET);
    assert!(client.complete_login_callback(&callback).await.unwrap());

    let resp = client.get().user(FormData::new()).await.unwrap();
    assert!(resp.status);
    assert_eq!(resp.user().unwrap().username, "bob");
    assert_eq!(client.access_token().await, "at_2");
    assert_eq!(client.refresh_token().await, "rt_1");

    // a fresh store over the same file sees the rotated token
    let reloaded = FileStore::load(dir.path().join("credentials.json"))
        .await
        .unwrap();
    let fresh = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .token_store(Arc::new(reloaded))
        .build()
        .unwrap();
    assert_eq!(fresh.access_token().await, "at_2");
    assert_eq!(fresh.refresh_token().await, "rt_1");
}

#[tokio::test]
async fn tampered_rotation_over_http_fails_call() {
    let server = MockServer::start().await;
    let forged = signed(&[("accessToken", "at_evil")], "attacker-secret");
    Mock::given(method("GET"))
        .and(path("/user/sales"))
        .respond_with(
            json_reply(200, json!({"status": true, "data": {"sales": []}}))
                .insert_header("Authorization", format!("Bearer {forged}").as_str()),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, _store) = file_backed_client(&server, &dir).await;
    client.set_access_token("at_1").await.unwrap();
    client.set_refresh_token("rt_1").await.unwrap();

    let resp = client.get().sales().await.unwrap();
    assert!(!resp.status);
    assert!(resp.data.is_empty());
    assert_eq!(client.access_token().await, "at_1");
}

#[tokio::test]
async fn upload_sends_fields_and_file_in_multipart_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/vector"))
        .and(body_string_contains("name=\"title\""))
        .and(body_string_contains("Sunset"))
        .and(body_string_contains("<svg id=\"sunset\"/>"))
        .respond_with(json_reply(
            200,
            json!({"status": true, "data": {"vector": {"id": 5, "title": "Sunset"}}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svg = dir.path().join("sunset.svg");
    std::fs::write(&svg, "<svg id=\"sunset\"/>").unwrap();

    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .build()
        .unwrap();
    client.file("vector", &svg, "image/svg+xml");
    let resp = client
        .post()
        .vector(None, FormData::new().with("title", "Sunset"))
        .await
        .unwrap();

    assert_eq!(resp.vector().unwrap().id.as_deref(), Some("5"));
}

#[tokio::test]
async fn download_returns_raw_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vector/download/5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"<svg/>".to_vec(), "image/svg+xml"),
        )
        .mount(&server)
        .await;

    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .build()
        .unwrap();
    let resp = client.get().vector_download("5").await.unwrap();

    assert!(resp.status);
    assert_eq!(
        resp.get("vector").unwrap().as_file().unwrap().as_ref(),
        b"<svg/>"
    );
}

#[tokio::test]
async fn server_errors_are_failed_responses_not_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/buy"))
        .respond_with(json_reply(
            402,
            json!({"status": false, "data": {"messages": {"card": [
                {"code": 402, "type": "error", "message": "Card declined"}
            ]}}}),
        ))
        .mount(&server)
        .await;

    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .build()
        .unwrap();
    let resp = client.post().buy("5").await.unwrap();

    assert!(!resp.status);
    assert_eq!(resp.messages.count(), 1);
    assert_eq!(resp.messages.get("card").unwrap()[0].to_string(), "402 error Card declined");
}

#[tokio::test]
async fn request_log_records_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vector/search/sky"))
        .respond_with(json_reply(200, json!({"status": true, "data": {"vectors": []}})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("vec2.log");
    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url(server.uri())
        .enable_log(FileLog::new(&log_path, [LogField::Response]))
        .build()
        .unwrap();

    client.get().vector_search("sky").await.unwrap();
    client.get().vector_search("sky").await.unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("DATETIME"));
    assert!(lines[0].ends_with("RESPONSE"));
    assert!(lines[1].contains("/vector/search/sky"));
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let client = Vec2Client::builder("client-1", SECRET, "key-1")
        .url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let err = client.get().profile("bob").await.unwrap_err();
    assert!(matches!(err, vec2_client::Error::Transport(_)));
}
