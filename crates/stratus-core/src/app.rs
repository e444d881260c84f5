// ── Application context ──
//
// The handle every view model receives: one API client (and therefore one
// cookie jar), the session identity and the staleness flag. Engines are
// created from it so they share the client and the transient TTL.

use std::sync::Arc;

use stratus_api::transport::{TlsMode, TransportConfig};
use stratus_api::{ApiClient, SessionInfo, endpoints};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, TlsVerification};
use crate::engine::{
    DirectorySink, DownloadEngine, DownloadSink, HttpInit, RequestEngine, RequestMode,
    RequestOutcome,
};
use crate::error::CoreError;
use crate::session::{SessionIdentity, SessionStore};
use crate::staleness::StalenessSignal;

/// Shared client context.
///
/// Cheaply cloneable via `Arc<AppInner>`; every clone sees the same
/// session and staleness state.
#[derive(Clone)]
pub struct CloudApp {
    inner: Arc<AppInner>,
}

struct AppInner {
    config: ClientConfig,
    api: Arc<ApiClient>,
    session: SessionStore,
    staleness: StalenessSignal,
}

impl CloudApp {
    /// Build the HTTP client from `config`. Does NOT contact the server;
    /// call [`resolve_session()`](Self::resolve_session) for that.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let api = ApiClient::new(config.server_url.clone(), &transport)?;
        Ok(Self::with_api_client(config, api))
    }

    /// Use a pre-built API client (custom `reqwest::Client`, tests).
    pub fn with_api_client(config: ClientConfig, api: ApiClient) -> Self {
        Self {
            inner: Arc::new(AppInner {
                config,
                api: Arc::new(api),
                session: SessionStore::new(),
                staleness: StalenessSignal::new(),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.inner.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn staleness(&self) -> &StalenessSignal {
        &self.inner.staleness
    }

    // ── Engine factories ─────────────────────────────────────────────

    pub fn request_engine(&self, mode: RequestMode) -> RequestEngine {
        RequestEngine::new(
            Arc::clone(&self.inner.api),
            mode,
            self.inner.config.transient_ttl,
        )
    }

    /// Download engine writing into the configured download directory.
    pub fn download_engine(&self) -> DownloadEngine {
        self.download_engine_with(DirectorySink::new(self.inner.config.download_dir.clone()))
    }

    pub fn download_engine_with<S: DownloadSink>(&self, sink: S) -> DownloadEngine<S> {
        DownloadEngine::new(
            Arc::clone(&self.inner.api),
            sink,
            self.inner.config.transient_ttl,
        )
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Probe the server once for an existing session.
    ///
    /// `200` signs the identity in; any other status marks it signed out.
    /// A transport failure also marks it signed out and is returned. Once
    /// resolved, later calls return the current identity without probing.
    pub async fn resolve_session(&self) -> Result<SessionIdentity, Arc<CoreError>> {
        let session = &self.inner.session;
        if session.is_resolved() {
            return Ok(session.identity());
        }

        let engine = self.request_engine(RequestMode::Json);
        match engine.execute(endpoints::SESSION, HttpInit::get()).await {
            RequestOutcome::Settled(state) if state.status == 200 => {
                match state.decode::<SessionInfo>() {
                    Ok(info) => {
                        info!(user = %info.username, "existing session found");
                        session.sign_in(&info);
                    }
                    Err(e) => {
                        warn!(error = %e, "session probe reply is malformed");
                        session.mark_unauthenticated();
                        return Err(Arc::new(e));
                    }
                }
            }
            RequestOutcome::Settled(state) => {
                debug!(status = state.status, "no active session");
                session.mark_unauthenticated();
            }
            RequestOutcome::Failed(err) => {
                session.mark_unauthenticated();
                return Err(err);
            }
            RequestOutcome::Idle | RequestOutcome::Pending => {
                session.mark_unauthenticated();
            }
        }
        Ok(session.identity())
    }
}

impl std::fmt::Debug for CloudApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudApp")
            .field("server_url", &self.inner.config.server_url.as_str())
            .field("session", &self.inner.session.identity())
            .finish_non_exhaustive()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &ClientConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        cookie_jar: None,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
