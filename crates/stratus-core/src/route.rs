//! Navigation targets of the storage client.

use std::fmt;

/// A location the front-end can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Registration,
    AdminPanel,
    /// The signed-in user's own files.
    Dashboard,
    /// Another account's files, as opened from the admin panel.
    UserDashboard(u64),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".into(),
            Self::Login => "/login".into(),
            Self::Registration => "/registration".into(),
            Self::AdminPanel => "/admin-panel".into(),
            Self::Dashboard => "/dashboard".into(),
            Self::UserDashboard(id) => format!("/dashboard/{id}"),
        }
    }

    /// Where a freshly signed-in user lands.
    pub fn landing(is_admin: bool) -> Self {
        if is_admin {
            Self::AdminPanel
        } else {
            Self::Dashboard
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_match_router() {
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::AdminPanel.to_string(), "/admin-panel");
        assert_eq!(Route::UserDashboard(9).path(), "/dashboard/9");
    }

    #[test]
    fn landing_depends_on_role() {
        assert_eq!(Route::landing(true), Route::AdminPanel);
        assert_eq!(Route::landing(false), Route::Dashboard);
    }
}
