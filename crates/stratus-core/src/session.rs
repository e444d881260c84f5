// ── Session identity store ──
//
// One shared record of who is signed in. Every field starts unresolved
// (`None`) and is filled by the session probe, login or logout. Route
// gating reads from here: nothing gated renders until the probe is done.

use std::sync::Arc;

use serde::Serialize;
use stratus_api::SessionInfo;
use tokio::sync::watch;
use tracing::debug;

use crate::route::Route;

/// Identity of the current client session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionIdentity {
    /// `None` until the session probe has answered.
    pub is_authenticated: Option<bool>,
    pub is_admin: Option<bool>,
    pub username: Option<String>,
    pub user_id: Option<u64>,
}

impl SessionIdentity {
    /// The signed-out terminal state.
    pub fn signed_out() -> Self {
        Self {
            is_authenticated: Some(false),
            is_admin: Some(false),
            username: None,
            user_id: None,
        }
    }

    pub fn signed_in(info: &SessionInfo) -> Self {
        Self {
            is_authenticated: Some(true),
            is_admin: Some(info.is_admin),
            username: Some(info.username.clone()),
            user_id: Some(info.user_id),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.is_authenticated.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated == Some(true)
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.is_admin == Some(true)
    }
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

impl Access {
    pub fn for_route(route: Route) -> Self {
        match route {
            Route::Home | Route::Login | Route::Registration => Self::Public,
            Route::Dashboard => Self::Authenticated,
            Route::AdminPanel | Route::UserDashboard(_) => Self::Admin,
        }
    }
}

/// Decision of the route gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Session not resolved yet; render nothing.
    Loading,
    Render,
    Redirect(Route),
}

/// Shared, observable session identity.
#[derive(Debug, Clone)]
pub struct SessionStore {
    identity: Arc<watch::Sender<SessionIdentity>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(SessionIdentity::default());
        Self {
            identity: Arc::new(identity),
        }
    }

    /// Snapshot of the current identity.
    pub fn identity(&self) -> SessionIdentity {
        self.identity.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionIdentity> {
        self.identity.subscribe()
    }

    pub fn is_resolved(&self) -> bool {
        self.identity.borrow().is_resolved()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.borrow().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.identity.borrow().is_admin()
    }

    pub fn user_id(&self) -> Option<u64> {
        self.identity.borrow().user_id
    }

    /// Record a confirmed sign-in (session probe 200 or login 200).
    pub fn sign_in(&self, info: &SessionInfo) {
        debug!(user = %info.username, admin = info.is_admin, "session signed in");
        self.identity.send_replace(SessionIdentity::signed_in(info));
    }

    /// Reset to the signed-out terminal state.
    pub fn sign_out(&self) {
        debug!("session signed out");
        self.identity.send_replace(SessionIdentity::signed_out());
    }

    /// The session probe was refused or failed. Only the authentication
    /// flags change; stale name and id fields are left as they were.
    pub fn mark_unauthenticated(&self) {
        self.identity.send_modify(|identity| {
            identity.is_authenticated = Some(false);
            identity.is_admin = Some(false);
        });
    }

    /// Resolve once the session probe has answered.
    pub async fn wait_resolved(&self) -> SessionIdentity {
        let mut rx = self.identity.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let resolved = rx.wait_for(SessionIdentity::is_resolved).await;
        resolved.map_or_else(|_| self.identity(), |identity| identity.clone())
    }

    /// Route gate: may content with this access level render now?
    pub fn gate(&self, access: Access) -> Gate {
        let identity = self.identity.borrow();
        if !identity.is_resolved() {
            return Gate::Loading;
        }
        match access {
            Access::Public => Gate::Render,
            Access::Authenticated if identity.is_authenticated() => Gate::Render,
            Access::Authenticated => Gate::Redirect(Route::Login),
            Access::Admin if identity.is_admin() => Gate::Render,
            Access::Admin => Gate::Redirect(Route::Home),
        }
    }

    /// [`gate`](Self::gate) for a concrete route.
    pub fn gate_route(&self, route: Route) -> Gate {
        self.gate(Access::for_route(route))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn info(id: u64, name: &str, admin: bool) -> SessionInfo {
        SessionInfo {
            user_id: id,
            username: name.into(),
            is_admin: admin,
        }
    }

    #[test]
    fn starts_unresolved_and_gates_loading() {
        let store = SessionStore::new();
        assert!(!store.is_resolved());
        assert_eq!(store.gate(Access::Public), Gate::Loading);
        assert_eq!(store.gate(Access::Admin), Gate::Loading);
    }

    #[test]
    fn sign_in_populates_all_fields() {
        let store = SessionStore::new();
        store.sign_in(&info(7, "ann", false));
        assert_eq!(
            store.identity(),
            SessionIdentity {
                is_authenticated: Some(true),
                is_admin: Some(false),
                username: Some("ann".into()),
                user_id: Some(7),
            }
        );
    }

    #[test]
    fn sign_out_is_terminal_state() {
        let store = SessionStore::new();
        store.sign_in(&info(1, "root", true));
        store.sign_out();
        assert_eq!(store.identity(), SessionIdentity::signed_out());
    }

    #[test]
    fn mark_unauthenticated_keeps_other_fields() {
        let store = SessionStore::new();
        store.sign_in(&info(4, "dan", true));
        store.mark_unauthenticated();
        let identity = store.identity();
        assert_eq!(identity.is_authenticated, Some(false));
        assert_eq!(identity.is_admin, Some(false));
        assert_eq!(identity.username.as_deref(), Some("dan"));
    }

    #[test]
    fn gate_redirects_by_role() {
        let store = SessionStore::new();
        store.sign_out();
        assert_eq!(store.gate(Access::Public), Gate::Render);
        assert_eq!(store.gate(Access::Authenticated), Gate::Redirect(Route::Login));
        assert_eq!(store.gate(Access::Admin), Gate::Redirect(Route::Home));

        store.sign_in(&info(2, "bob", false));
        assert_eq!(store.gate_route(Route::Dashboard), Gate::Render);
        assert_eq!(store.gate_route(Route::AdminPanel), Gate::Redirect(Route::Home));

        store.sign_in(&info(1, "root", true));
        assert_eq!(store.gate_route(Route::UserDashboard(2)), Gate::Render);
    }

    #[tokio::test]
    async fn wait_resolved_wakes_on_probe_answer() {
        let store = SessionStore::new();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_resolved().await })
        };
        tokio::task::yield_now().await;
        store.mark_unauthenticated();
        let identity = waiter.await.unwrap_or_default();
        assert_eq!(identity.is_authenticated, Some(false));
    }
}
