// ── Request engines ──
//
// Every server interaction goes through an engine: it performs the call,
// classifies the response and publishes exactly one `RequestOutcome` at a
// time. Engines never return errors to the caller; failures become
// observable state that clears itself after the transient TTL.

mod download;
mod request;
mod tracker;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;

pub use download::{DirectorySink, DownloadEngine, DownloadSink, filename_from_headers};
pub use request::RequestEngine;

// ── Mode ─────────────────────────────────────────────────────────────

/// How a [`RequestEngine`] treats the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    /// Parse the body as JSON and keep it. Failed statuses auto-clear.
    #[default]
    Json,
    /// Ignore the body entirely and record the status only. For endpoints
    /// whose success reply has no body (`204 No Content`).
    StatusOnly,
    /// Like `Json`, but the result always auto-clears after settling so a
    /// success banner disappears on its own.
    Uploader,
}

// ── Observable state ─────────────────────────────────────────────────

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body. Always `None` for status-only and binary calls.
    pub result: Option<serde_json::Value>,
}

impl RequestState {
    pub fn status_only(status: u16) -> Self {
        Self {
            status,
            result: None,
        }
    }

    /// `true` for 2xx statuses (the fetch API's `response.ok`).
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the JSON body into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        let value = self.result.clone().ok_or_else(|| CoreError::Deserialization {
            message: format!("HTTP {} reply has no body", self.status),
        })?;
        Ok(serde_json::from_value(value)?)
    }

    /// The backend's free-form `detail` message, if present.
    pub fn detail(&self) -> Option<&str> {
        self.result.as_ref()?.get("detail")?.as_str()
    }
}

/// The externally observable shape of an engine.
///
/// `Idle` is the empty state: no completed request, or a result that has
/// been auto-cleared.
#[derive(Debug, Clone, Default)]
pub enum RequestOutcome {
    #[default]
    Idle,
    Pending,
    Settled(RequestState),
    Failed(Arc<CoreError>),
}

impl RequestOutcome {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn state(&self) -> Option<&RequestState> {
        match self {
            Self::Settled(state) => Some(state),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.state().map(|s| s.status)
    }

    pub fn error(&self) -> Option<&Arc<CoreError>> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Settled with exactly this status.
    pub fn has_status(&self, status: u16) -> bool {
        self.status() == Some(status)
    }
}

// ── Request description ──────────────────────────────────────────────

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

/// Everything about a call except its endpoint.
///
/// A present `method` marks the call as mutating: the engine fetches a
/// CSRF token before sending it. `HttpInit::get()` leaves the method unset
/// and is sent as a plain `GET`.
#[derive(Debug, Default)]
pub struct HttpInit {
    method: Option<Method>,
    headers: HeaderMap,
    body: RequestBody,
}

impl HttpInit {
    /// A read-only `GET` (no CSRF token).
    pub fn get() -> Self {
        Self::default()
    }

    /// A call with an explicit method, which makes it mutating.
    pub fn method(method: Method) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }

    pub fn post() -> Self {
        Self::method(Method::POST)
    }

    pub fn patch() -> Self {
        Self::method(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::method(Method::DELETE)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, CoreError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a multipart form body.
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Add a request header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_mutating(&self) -> bool {
        self.method.is_some()
    }

    pub(crate) fn http_method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// Move headers and body onto a request builder.
    pub(crate) fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.headers(self.headers);
        match self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        }
    }
}
