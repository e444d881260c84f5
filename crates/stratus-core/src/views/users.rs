// Admin panel and per-user rows.

use stratus_api::{CloudUser, UserPatch, endpoints};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::build_failure;
use crate::app::CloudApp;
use crate::engine::{HttpInit, RequestEngine, RequestMode, RequestOutcome};
use crate::error::CoreError;
use crate::route::Route;

// ── Panel ────────────────────────────────────────────────────────────

/// Account listing for administrators.
pub struct AdminPanel {
    app: CloudApp,
    engine: RequestEngine,
    shutdown: CancellationToken,
    watcher: Option<JoinHandle<()>>,
}

impl AdminPanel {
    pub fn new(app: &CloudApp) -> Self {
        Self {
            app: app.clone(),
            engine: app.request_engine(RequestMode::Json),
            shutdown: CancellationToken::new(),
            watcher: None,
        }
    }

    /// Start watching for staleness and load the accounts.
    ///
    /// Only an authenticated administrator triggers the initial fetch.
    pub async fn mount(&mut self) -> RequestOutcome {
        if self.watcher.is_none() {
            let engine = self.engine.clone();
            let handle = self
                .app
                .staleness()
                .watch_spawn(self.shutdown.clone(), move || {
                    let engine = engine.clone();
                    async move {
                        engine.execute(endpoints::USERS, HttpInit::get()).await;
                    }
                });
            self.watcher = Some(handle);
        }

        if !self.app.session().is_admin() {
            debug!("admin panel mounted without admin rights; not fetching");
            return RequestOutcome::Idle;
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> RequestOutcome {
        self.engine.execute(endpoints::USERS, HttpInit::get()).await
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.engine.outcome()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestOutcome> {
        self.engine.subscribe()
    }

    pub fn users(&self) -> Option<Vec<CloudUser>> {
        let outcome = self.engine.outcome();
        let state = outcome.state().filter(|s| s.status == 200)?;
        state.decode().ok()
    }
}

impl Drop for AdminPanel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// ── Row ──────────────────────────────────────────────────────────────

/// Actions on one account. The signed-in admin cannot delete their own
/// account or change their own role.
pub struct UserRow {
    app: CloudApp,
    user: CloudUser,
    remove: RequestEngine,
    update: RequestEngine,
}

impl UserRow {
    pub fn new(app: &CloudApp, user: CloudUser) -> Self {
        Self {
            app: app.clone(),
            user,
            remove: app.request_engine(RequestMode::StatusOnly),
            update: app.request_engine(RequestMode::Json),
        }
    }

    pub fn user(&self) -> &CloudUser {
        &self.user
    }

    pub fn is_self(&self) -> bool {
        self.app.session().user_id() == Some(self.user.id)
    }

    /// Storage view for this account.
    pub fn storage_route(&self) -> Route {
        if self.is_self() {
            Route::Dashboard
        } else {
            Route::UserDashboard(self.user.id)
        }
    }

    pub fn delete_outcome(&self) -> RequestOutcome {
        self.remove.outcome()
    }

    pub fn update_outcome(&self) -> RequestOutcome {
        self.update.outcome()
    }

    /// Delete the account. `204` marks the listing stale.
    pub async fn delete(&self) -> Result<RequestOutcome, CoreError> {
        if self.is_self() {
            return Err(CoreError::Rejected {
                message: "you cannot delete your own account".into(),
            });
        }
        let outcome = self
            .remove
            .execute(&endpoints::user(self.user.id), HttpInit::delete())
            .await;
        if outcome.has_status(204) {
            self.app.staleness().raise();
        }
        Ok(outcome)
    }

    /// Grant or revoke administrator rights. `200` marks the listing stale.
    pub async fn set_admin(&self, is_superuser: bool) -> Result<RequestOutcome, CoreError> {
        if self.is_self() {
            return Err(CoreError::Rejected {
                message: "you cannot change your own role".into(),
            });
        }
        let init = match HttpInit::patch().json(&UserPatch { is_superuser }) {
            Ok(init) => init,
            Err(e) => return Ok(build_failure(e)),
        };
        let outcome = self.update.execute(&endpoints::user(self.user.id), init).await;
        if outcome.has_status(200) {
            self.app.staleness().raise();
        }
        Ok(outcome)
    }
}
