// Login, logout and registration forms.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use stratus_api::{FieldErrors, SessionInfo, endpoints};
use tracing::{debug, info};

use super::failure_message;
use crate::app::CloudApp;
use crate::engine::{HttpInit, RequestEngine, RequestMode, RequestOutcome};
use crate::error::CoreError;
use crate::route::Route;
use crate::session::SessionIdentity;

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum LoginResult {
    /// Credentials accepted; the identity is already stored.
    Authenticated {
        identity: SessionIdentity,
        target: Route,
    },
    /// The server refused the credentials.
    Rejected { detail: String },
    CommunicationError(Arc<CoreError>),
}

pub struct LoginForm {
    app: CloudApp,
    engine: RequestEngine,
}

impl LoginForm {
    pub fn new(app: &CloudApp) -> Self {
        Self {
            app: app.clone(),
            engine: app.request_engine(RequestMode::Json),
        }
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.engine.outcome()
    }

    /// Submit credentials.
    ///
    /// On success the form waits the redirect delay (the success banner is
    /// visible meanwhile), then stores the identity and names the landing
    /// route. A refusal leaves the session untouched.
    pub async fn submit(&self, username: &str, password: &SecretString) -> LoginResult {
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let init = match HttpInit::post().json(&body) {
            Ok(init) => init,
            Err(e) => return LoginResult::CommunicationError(Arc::new(e)),
        };

        let state = match self.engine.execute(endpoints::LOGIN, init).await {
            RequestOutcome::Settled(state) => state,
            RequestOutcome::Failed(err) => return LoginResult::CommunicationError(err),
            RequestOutcome::Idle | RequestOutcome::Pending => {
                return LoginResult::CommunicationError(Arc::new(CoreError::Cancelled));
            }
        };

        if state.status != 200 {
            debug!(status = state.status, "login refused");
            return LoginResult::Rejected {
                detail: failure_message(&state),
            };
        }

        let info: SessionInfo = match state.decode() {
            Ok(info) => info,
            Err(e) => return LoginResult::CommunicationError(Arc::new(e)),
        };

        tokio::time::sleep(self.app.config().redirect_delay).await;
        self.app.session().sign_in(&info);
        info!(user = %info.username, "logged in");

        LoginResult::Authenticated {
            identity: self.app.session().identity(),
            target: Route::landing(info.is_admin),
        }
    }
}

// ── Logout ───────────────────────────────────────────────────────────

pub struct LogoutControl {
    app: CloudApp,
    engine: RequestEngine,
}

impl LogoutControl {
    pub fn new(app: &CloudApp) -> Self {
        Self {
            app: app.clone(),
            engine: app.request_engine(RequestMode::Json),
        }
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.engine.outcome()
    }

    /// End the session. Only a `200` resets the identity.
    pub async fn logout(&self) -> Result<(), Arc<CoreError>> {
        match self.engine.execute(endpoints::LOGOUT, HttpInit::post()).await {
            RequestOutcome::Settled(state) if state.status == 200 => {
                self.app.session().sign_out();
                info!("logged out");
                Ok(())
            }
            RequestOutcome::Settled(state) => Err(Arc::new(CoreError::Rejected {
                message: failure_message(&state),
            })),
            RequestOutcome::Failed(err) => Err(err),
            RequestOutcome::Idle | RequestOutcome::Pending => Err(Arc::new(CoreError::Cancelled)),
        }
    }
}

// ── Registration ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum RegistrationResult {
    /// Account created; continue at the login page.
    Registered { target: Route },
    /// `400` with per-field messages.
    Invalid(FieldErrors),
    Rejected { detail: String },
    CommunicationError(Arc<CoreError>),
}

pub struct RegistrationForm {
    app: CloudApp,
    engine: RequestEngine,
}

impl RegistrationForm {
    pub fn new(app: &CloudApp) -> Self {
        Self {
            app: app.clone(),
            engine: app.request_engine(RequestMode::Json),
        }
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.engine.outcome()
    }

    pub async fn submit(
        &self,
        username: &str,
        password: &SecretString,
        email: &str,
    ) -> RegistrationResult {
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "email": email,
        });
        let init = match HttpInit::post().json(&body) {
            Ok(init) => init,
            Err(e) => return RegistrationResult::CommunicationError(Arc::new(e)),
        };

        let state = match self.engine.execute(endpoints::REGISTRATION, init).await {
            RequestOutcome::Settled(state) => state,
            RequestOutcome::Failed(err) => return RegistrationResult::CommunicationError(err),
            RequestOutcome::Idle | RequestOutcome::Pending => {
                return RegistrationResult::CommunicationError(Arc::new(CoreError::Cancelled));
            }
        };

        match state.status {
            201 => {
                tokio::time::sleep(self.app.config().redirect_delay).await;
                info!(user = username, "account registered");
                RegistrationResult::Registered {
                    target: Route::Login,
                }
            }
            400 => match state.decode::<FieldErrors>() {
                Ok(errors) if !errors.is_empty() => RegistrationResult::Invalid(errors),
                _ => RegistrationResult::Rejected {
                    detail: failure_message(&state),
                },
            },
            _ => RegistrationResult::Rejected {
                detail: failure_message(&state),
            },
        }
    }
}
