// stratus-core: Request orchestration and session state for the Stratus
// storage client (CLI and any other front-end).

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod route;
pub mod session;
pub mod staleness;
pub mod views;

// ── Primary re-exports ──────────────────────────────────────────────
pub use app::CloudApp;
pub use config::{ClientConfig, REDIRECT_DELAY, TRANSIENT_TTL, TlsVerification};
pub use engine::{
    DirectorySink, DownloadEngine, DownloadSink, HttpInit, RequestBody, RequestEngine,
    RequestMode, RequestOutcome, RequestState,
};
pub use error::CoreError;
pub use route::Route;
pub use session::{Access, Gate, SessionIdentity, SessionStore};
pub use staleness::StalenessSignal;
pub use views::{
    AdminPanel, FileCard, FileDashboard, LoginForm, LoginResult, LogoutControl,
    RegistrationForm, RegistrationResult, Uploader, UserRow, failure_message,
};

// Wire types callers need alongside the view models.
pub use stratus_api::{CloudUser, FieldErrors, SessionInfo, StoredFile, UserFiles};
