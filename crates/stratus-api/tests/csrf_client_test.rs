#![allow(clippy::unwrap_used)]
// Integration tests for the CSRF token provider using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stratus_api::{ApiClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Token tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_token_success() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/csrf/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"csrf": "tok-123"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.fetch_csrf_token().await.as_deref(), Some("tok-123"));
}

#[tokio::test]
async fn test_fetch_token_non_200_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/csrf/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"csrf": "ignored"})))
        .mount(&server)
        .await;

    assert!(client.fetch_csrf_token().await.is_none());
}

#[tokio::test]
async fn test_fetch_token_missing_field_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/csrf/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
        .mount(&server)
        .await;

    assert!(client.fetch_csrf_token().await.is_none());
}

#[tokio::test]
async fn test_fetch_token_garbage_body_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/csrf/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    assert!(client.fetch_csrf_token().await.is_none());
}

#[tokio::test]
async fn test_fetch_token_unreachable_is_none() {
    // Nothing listens on port 9 of localhost in the test environment.
    let client = ApiClient::new(
        Url::parse("http://127.0.0.1:9").unwrap(),
        &TransportConfig::default(),
    )
    .unwrap();

    assert!(client.fetch_csrf_token().await.is_none());
}

#[tokio::test]
async fn test_cookies_from_csrf_reply_are_kept() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/csrf/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=abc; Path=/")
                .set_body_json(json!({"csrf": "abc"})),
        )
        .mount(&server)
        .await;

    client.fetch_csrf_token().await.unwrap();
    assert_eq!(client.cookie_header().as_deref(), Some("csrftoken=abc"));
}
