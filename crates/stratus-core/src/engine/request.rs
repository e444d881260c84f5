// ── JSON request engine ──
//
// Performs one call at a time against the storage API: CSRF injection for
// mutating calls, mode-specific body handling, and transient expiry of
// failed or auto-dismissed results.

use std::sync::Arc;
use std::time::Duration;

use stratus_api::{ApiClient, CSRF_HEADER, NULL_TOKEN};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use super::tracker::Tracker;
use super::{HttpInit, RequestMode, RequestOutcome, RequestState};
use crate::error::CoreError;

/// Executes API calls and publishes their [`RequestOutcome`].
///
/// Cheaply cloneable: clones share the same in-flight call and observable
/// state. Dropping the last clone cancels any pending transient timer.
#[derive(Clone)]
pub struct RequestEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    api: Arc<ApiClient>,
    mode: RequestMode,
    tracker: Arc<Tracker>,
}

impl RequestEngine {
    /// Create an engine. `ttl` is how long failures (and, depending on
    /// `mode`, results) stay visible before expiring.
    pub fn new(api: Arc<ApiClient>, mode: RequestMode, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                api,
                mode,
                tracker: Tracker::new(ttl),
            }),
        }
    }

    pub fn mode(&self) -> RequestMode {
        self.inner.mode
    }

    /// Current observable state.
    pub fn outcome(&self) -> RequestOutcome {
        self.inner.tracker.outcome()
    }

    pub fn is_loading(&self) -> bool {
        self.outcome().is_loading()
    }

    /// Watch every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RequestOutcome> {
        self.inner.tracker.subscribe()
    }

    /// Abort the in-flight call (if any) and return to the pre-call state.
    pub fn cancel(&self) {
        self.inner.tracker.cancel_current();
    }

    /// Perform a call and publish its outcome.
    ///
    /// Starting a call supersedes the previous one: its completion is
    /// discarded and its transient timer cancelled. The returned value is
    /// this call's own outcome; a superseded or cancelled call returns
    /// `Failed(Cancelled)` without touching the published state.
    pub async fn execute(&self, endpoint: &str, init: HttpInit) -> RequestOutcome {
        let tracker = &self.inner.tracker;
        let call = tracker.begin();
        let token = call.token().clone();

        let result = tokio::select! {
            () = token.cancelled() => None,
            res = self.perform(endpoint, init) => Some(res),
        };

        match result {
            None => {
                debug!(endpoint, "request cancelled");
                tracker.abandon(&call);
                RequestOutcome::Failed(Arc::new(CoreError::Cancelled))
            }
            Some(Ok(state)) => {
                let auto_clear = self.inner.mode == RequestMode::Uploader || !state.is_ok();
                tracker.settle(&call, state.clone(), auto_clear);
                RequestOutcome::Settled(state)
            }
            Some(Err(err)) => {
                warn!(endpoint, error = %err, "request failed");
                let err = Arc::new(err);
                tracker.fail(&call, Arc::clone(&err));
                RequestOutcome::Failed(err)
            }
        }
    }

    async fn perform(&self, endpoint: &str, init: HttpInit) -> Result<RequestState, CoreError> {
        let api = &self.inner.api;
        let mutating = init.is_mutating();
        let builder = api.request(init.http_method(), endpoint)?;
        let mut builder = init.apply(builder);

        if mutating {
            let token = api.fetch_csrf_token().await;
            trace!(present = token.is_some(), "attaching CSRF token");
            builder = builder.header(CSRF_HEADER, token.as_deref().unwrap_or(NULL_TOKEN));
        }

        let resp = builder.send().await.map_err(stratus_api::Error::from)?;
        let status = resp.status().as_u16();
        debug!(endpoint, status, "response received");

        if self.inner.mode == RequestMode::StatusOnly {
            return Ok(RequestState::status_only(status));
        }

        let body = resp.bytes().await.map_err(stratus_api::Error::from)?;
        // Some endpoints answer with an empty body; that is a result-less
        // state, not a parse failure.
        let result = if body.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(serde_json::from_slice(&body)?)
        };
        Ok(RequestState { status, result })
    }
}

impl std::fmt::Debug for RequestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEngine")
            .field("mode", &self.inner.mode)
            .field("outcome", &self.outcome())
            .finish_non_exhaustive()
    }
}
