// API HTTP client
//
// Wraps `reqwest::Client` with server-relative URL construction and the
// shared cookie jar. Request state machines live in `stratus-core`; this
// type only knows how to reach the server.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, RequestBuilder};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the storage service.
///
/// Cookies are included on every request: the jar carries the session
/// cookie between calls, which is what makes the service "credentialed".
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    /// Cookie jar reference for inspecting the session (e.g. in diagnostics).
    cookie_jar: Option<Arc<Jar>>,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (session auth requires cookies). `base_url` is the
    /// server root, e.g. `https://cloud.example.com`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for enabling a cookie store on `http`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            cookie_jar: None,
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `Cookie` header the jar would send to the server, if any.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a server-relative path.
    ///
    /// The path is appended verbatim so a base URL with a path prefix
    /// (`https://host/storage`) keeps that prefix.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a request for a server-relative path.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        let url = self.endpoint_url(path)?;
        debug!("{method} {url}");
        Ok(self.http.request(method, url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn endpoint_url_joins_root() {
        let url = client("https://cloud.example.com").endpoint_url("/api/session/");
        assert_eq!(url.unwrap().as_str(), "https://cloud.example.com/api/session/");
    }

    #[test]
    fn endpoint_url_keeps_base_prefix() {
        let url = client("https://example.com/storage/").endpoint_url("/api/csrf/");
        assert_eq!(url.unwrap().as_str(), "https://example.com/storage/api/csrf/");
    }

    #[test]
    fn cookie_header_absent_without_jar() {
        assert!(client("https://example.com").cookie_header().is_none());
    }
}
