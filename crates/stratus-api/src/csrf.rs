// CSRF token provider
//
// The backend hands out a fresh anti-forgery token on `GET /api/csrf/`.
// Tokens are never cached: every mutating request fetches its own.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::client::ApiClient;
use crate::endpoints;

/// Header the backend reads the anti-forgery token from.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Header value sent when no token could be obtained. The request still
/// goes out; rejecting it is the server's call.
pub const NULL_TOKEN: &str = "null";

#[derive(Deserialize)]
struct CsrfReply {
    csrf: Option<String>,
}

impl ApiClient {
    /// Fetch a fresh CSRF token.
    ///
    /// Returns `None` on any non-200 status, a missing `csrf` field, or a
    /// transport/parse failure. Never errors and never retries; the caller
    /// decides whether a missing token should stop the enclosing mutation.
    pub async fn fetch_csrf_token(&self) -> Option<String> {
        let url = match self.endpoint_url(endpoints::CSRF) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build CSRF endpoint URL");
                return None;
            }
        };

        let resp = match self.http().get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "CSRF token request failed");
                return None;
            }
        };

        if resp.status() != StatusCode::OK {
            debug!(status = %resp.status(), "CSRF endpoint refused to issue a token");
            return None;
        }

        match resp.json::<CsrfReply>().await {
            Ok(reply) => {
                trace!(present = reply.csrf.is_some(), "CSRF token received");
                reply.csrf
            }
            Err(e) => {
                warn!(error = %e, "CSRF reply is not valid JSON");
                None
            }
        }
    }
}
