//! Session command handlers: whoami, login, logout, register.

use secrecy::SecretString;
use tracing::debug;

use stratus_core::{
    CloudApp, LoginForm, LoginResult, LogoutControl, RegistrationForm, RegistrationResult, Route,
    SessionIdentity,
};

use crate::cli::{GlobalOpts, LoginArgs, LogoutArgs, RegisterArgs};
use crate::config::{self, Target};
use crate::error::CliError;
use crate::output;

// ── Sign-in plumbing ────────────────────────────────────────────────

/// Submit credentials through the login form.
async fn sign_in(
    app: &CloudApp,
    target: &Target,
    username: &str,
    password: &SecretString,
) -> Result<SessionIdentity, CliError> {
    match LoginForm::new(app).submit(username, password).await {
        LoginResult::Authenticated { identity, target: landing } => {
            debug!(%landing, "signed in");
            Ok(identity)
        }
        LoginResult::Rejected { detail } => Err(CliError::AuthFailed {
            profile: target.profile_name.clone(),
            detail,
        }),
        LoginResult::CommunicationError(err) => Err(err.into()),
    }
}

/// Probe for a session and sign in with the profile's credentials if
/// there is none.
pub async fn ensure_session(
    app: &CloudApp,
    target: &Target,
    global: &GlobalOpts,
) -> Result<SessionIdentity, CliError> {
    let identity = app.resolve_session().await?;
    if identity.is_authenticated() {
        return Ok(identity);
    }
    let (username, password) = config::resolve_credentials(target, global)?;
    sign_in(app, target, &username, &password).await
}

fn identity_detail(identity: &SessionIdentity) -> String {
    if !identity.is_authenticated() {
        return "Not signed in".into();
    }
    let role = if identity.is_admin() {
        "administrator"
    } else {
        "user"
    };
    output::detail_block(&[
        ("Username", identity.username.clone().unwrap_or_default()),
        (
            "User ID",
            identity.user_id.map(|id| id.to_string()).unwrap_or_default(),
        ),
        ("Role", role.into()),
        ("Home", Route::landing(identity.is_admin()).path()),
    ])
}

// ── Handlers ────────────────────────────────────────────────────────

/// Show the current identity, signing in first when credentials exist.
pub async fn whoami(app: &CloudApp, target: &Target, global: &GlobalOpts) -> Result<(), CliError> {
    let mut identity = app.resolve_session().await?;
    if !identity.is_authenticated() {
        match config::resolve_credentials(target, global) {
            Ok((username, password)) => {
                identity = sign_in(app, target, &username, &password).await?;
            }
            Err(CliError::NoCredentials { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    let out = output::render_single(&global.output, &identity, identity_detail, |i| {
        i.username.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn login(
    app: &CloudApp,
    target: &Target,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let identity = app.resolve_session().await?;
    if identity.is_authenticated() && !args.save {
        let name = identity.username.unwrap_or_default();
        output::success(global, &format!("Already signed in as {name}"));
        return Ok(());
    }

    let (username, password) = config::resolve_credentials(target, global)?;
    let identity = sign_in(app, target, &username, &password).await?;

    if args.save {
        stratus_config::store_password(&target.profile_name, &password)?;
        output::success(
            global,
            &format!(
                "Password stored in system keyring for profile '{}'",
                target.profile_name
            ),
        );
    }

    let role = if identity.is_admin() {
        " (administrator)"
    } else {
        ""
    };
    output::success(global, &format!("Signed in as {username}{role}"));
    Ok(())
}

pub async fn logout(
    app: &CloudApp,
    target: &Target,
    args: LogoutArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    ensure_session(app, target, global).await?;
    LogoutControl::new(app).logout().await?;
    output::success(global, "Signed out");

    if args.forget {
        if stratus_config::forget_password(&target.profile_name)? {
            output::success(
                global,
                &format!("Removed stored password for '{}'", target.profile_name),
            );
        } else if !global.quiet {
            eprintln!("No stored password for '{}'", target.profile_name);
        }
    }
    Ok(())
}

pub async fn register(
    app: &CloudApp,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = match std::env::var("STRATUS_PASSWORD") {
        Ok(pw) => SecretString::from(pw),
        Err(_) => config::prompt_password(&args.username)?,
    };

    match RegistrationForm::new(app)
        .submit(&args.username, &password, &args.email)
        .await
    {
        RegistrationResult::Registered { .. } => {
            output::success(
                global,
                &format!(
                    "Account '{}' created. Sign in with: stratus login",
                    args.username
                ),
            );
            Ok(())
        }
        RegistrationResult::Invalid(errors) => {
            let messages = errors.messages();
            let field = messages.first().map_or("registration", |(f, _)| *f);
            let reason = messages
                .iter()
                .map(|(f, m)| format!("{f}: {m}"))
                .collect::<Vec<_>>()
                .join("; ");
            Err(CliError::Validation {
                field: field.into(),
                reason,
            })
        }
        RegistrationResult::Rejected { detail } => Err(CliError::Rejected { message: detail }),
        RegistrationResult::CommunicationError(err) => Err(err.into()),
    }
}
