//! Account administration handlers.

use bytesize::ByteSize;
use tabled::Tabled;

use stratus_core::{AdminPanel, CloudApp, CloudUser, UserRow};

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Admin")]
    admin: String,
    #[tabled(rename = "Files")]
    files: usize,
    #[tabled(rename = "Storage")]
    storage: String,
    #[tabled(rename = "Joined")]
    joined: String,
    #[tabled(rename = "Last login")]
    last_login: String,
}

impl From<&CloudUser> for AccountRow {
    fn from(u: &CloudUser) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            admin: if u.is_superuser { "yes" } else { "" }.into(),
            files: u.files.len(),
            storage: ByteSize::b(u.storage_used()).to_string(),
            joined: util::format_time(u.date_joined.as_ref()),
            last_login: util::format_time(u.last_login.as_ref()),
        }
    }
}

fn user_not_found(id: u64) -> CliError {
    CliError::NotFound {
        resource_type: "user".into(),
        identifier: id.to_string(),
        list_command: "users list".into(),
    }
}

/// Load all accounts; only administrators get a listing.
async fn load_panel(app: &CloudApp) -> Result<(AdminPanel, Vec<CloudUser>), CliError> {
    if !app.session().is_admin() {
        return Err(CliError::PermissionDenied {
            message: "account administration is limited to administrators".into(),
        });
    }
    let mut panel = AdminPanel::new(app);
    let state = util::require_status(panel.mount().await, 200, || CliError::ApiError {
        status: 404,
        message: "user listing not available".into(),
    })?;
    let users: Vec<CloudUser> = state.decode()?;
    Ok((panel, users))
}

async fn find_row(app: &CloudApp, id: u64) -> Result<UserRow, CliError> {
    let (_panel, users) = load_panel(app).await?;
    let user = users
        .into_iter()
        .find(|u| u.id == id)
        .ok_or_else(|| user_not_found(id))?;
    Ok(UserRow::new(app, user))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(app: &CloudApp, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List => {
            let (_panel, users) = load_panel(app).await?;
            let out = output::render_list(
                &global.output,
                &users,
                |u| AccountRow::from(u),
                |u| u.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Delete { id } => {
            let row = find_row(app, id).await?;
            if !util::confirm(
                &format!(
                    "Delete account '{}' and all of its files? This cannot be undone.",
                    row.user().username
                ),
                "users delete",
                global.yes,
            )? {
                return Ok(());
            }
            util::require_status(row.delete().await?, 204, || user_not_found(id))?;
            output::success(global, &format!("Deleted account {id}"));
            Ok(())
        }

        UsersCommand::Admin(admin) => {
            let row = find_row(app, admin.id).await?;
            let grant = admin.role.grant;
            util::require_status(row.set_admin(grant).await?, 200, || {
                user_not_found(admin.id)
            })?;
            let verb = if grant { "Granted" } else { "Revoked" };
            output::success(
                global,
                &format!(
                    "{verb} administrator rights for '{}'",
                    row.user().username
                ),
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use stratus_core::StoredFile;

    use super::*;

    #[test]
    fn row_sums_storage_and_flags_admins() {
        let file = |id, size| StoredFile {
            id,
            cloud_user: Some(5),
            filename: format!("f{id}"),
            size,
            comment: String::new(),
            date_uploaded: None,
            last_download: None,
            external_link_key: String::new(),
        };
        let user = CloudUser {
            id: 5,
            username: "eve".into(),
            email: "eve@example.com".into(),
            is_superuser: true,
            date_joined: None,
            last_login: None,
            files: vec![file(1, 1000), file(2, 24)],
        };

        let row = AccountRow::from(&user);
        assert_eq!(row.admin, "yes");
        assert_eq!(row.files, 2);
        assert_eq!(row.storage, ByteSize::b(1024).to_string());
    }
}
