// Shared helpers for stratus-core integration tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::time::{Duration, Instant};

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stratus_core::{ClientConfig, CloudApp};

/// Short transient lifetime so expiry is observable in tests.
pub const TTL: Duration = Duration::from_millis(150);

/// Short redirect delay.
pub const REDIRECT: Duration = Duration::from_millis(200);

pub fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
    config.transient_ttl = TTL;
    config.redirect_delay = REDIRECT;
    config.timeout = Duration::from_secs(5);
    config
}

pub async fn setup() -> (MockServer, CloudApp) {
    let server = MockServer::start().await;
    let app = CloudApp::new(config(&server)).unwrap();
    (server, app)
}

/// Serve a CSRF token on `GET /api/csrf/`.
pub async fn mount_csrf(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/csrf/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"csrf": token})))
        .mount(server)
        .await;
}

/// Poll `cond` every 10ms for up to two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Number of requests the server saw for `method path`.
pub async fn request_count(server: &MockServer, http_method: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == route)
        .count()
}
