// ── View models ──
//
// Screen-level behavior of the storage client without any rendering:
// each view owns its engines, reads and writes the shared `CloudApp`
// context, and reports results as plain enums.

mod auth;
mod files;
mod users;

use std::sync::Arc;

use stratus_api::FieldErrors;

use crate::engine::{RequestOutcome, RequestState};
use crate::error::CoreError;

pub use auth::{LoginForm, LoginResult, LogoutControl, RegistrationForm, RegistrationResult};
pub use files::{FileCard, FileDashboard, Uploader};
pub use users::{AdminPanel, UserRow};

/// Human-readable text for a request the server refused.
///
/// Prefers the backend's `detail`, then the first field message (e.g. the
/// uploader's `content` array), then the bare status.
pub fn failure_message(state: &RequestState) -> String {
    if let Some(detail) = state.detail() {
        return detail.to_owned();
    }
    state
        .decode::<FieldErrors>()
        .ok()
        .and_then(|errors| errors.messages().first().map(|(_, msg)| (*msg).to_owned()))
        .unwrap_or_else(|| format!("Server answered HTTP {}", state.status))
}

/// Error for an engine call whose body could not be built.
fn build_failure(err: CoreError) -> RequestOutcome {
    RequestOutcome::Failed(Arc::new(err))
}
