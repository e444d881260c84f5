// ── Runtime client configuration ──
//
// These types describe *how* to reach the storage server and how long
// transient UI state lives. They never touch disk: the CLI builds a
// `ClientConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// How long error banners and auto-dismissed results stay visible.
pub const TRANSIENT_TTL: Duration = Duration::from_secs(2);

/// Pause between a successful login/registration and the redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for one storage server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API server base URL (e.g., `https://cloud.example.com`).
    pub server_url: Url,
    /// Front-end origin used to build public share links. Defaults to
    /// `server_url` when unset.
    pub share_origin: Option<Url>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout. A request exceeding it is a transport failure.
    pub timeout: Duration,
    /// Lifetime of transient error/result state.
    pub transient_ttl: Duration,
    /// Delay before login/registration report their redirect target.
    pub redirect_delay: Duration,
    /// Where downloaded files are written.
    pub download_dir: PathBuf,
}

impl ClientConfig {
    /// Config with defaults for everything but the server URL.
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            share_origin: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            transient_ttl: TRANSIENT_TTL,
            redirect_delay: REDIRECT_DELAY,
            download_dir: PathBuf::from("."),
        }
    }

    /// Origin public share links are built against.
    pub fn share_origin(&self) -> &Url {
        self.share_origin.as_ref().unwrap_or(&self.server_url)
    }
}
