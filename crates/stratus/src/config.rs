//! CLI configuration: thin wrapper around `stratus_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--server, --username, etc.).

use std::io::IsTerminal;
use std::time::Duration;

use secrecy::SecretString;

use stratus_config::ConfigError;
use stratus_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use stratus_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// A resolved server: the profile it came from plus its runtime config.
#[derive(Debug)]
pub struct Target {
    pub profile_name: String,
    pub profile: Profile,
    pub client: ClientConfig,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Pick the profile and apply flag overrides.
///
/// Without a matching profile, `--server` alone is enough to build one.
pub fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.server.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let client = resolve_profile(&profile, &cfg.defaults, global)?;
    Ok(Target {
        profile_name,
        profile,
        client,
    })
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ClientConfig, CliError> {
    let mut effective = profile.clone();
    if let Some(ref server) = global.server {
        effective.server_url.clone_from(server);
    }
    if global.insecure {
        effective.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        effective.timeout = Some(secs);
    }

    let mut client = stratus_config::profile_to_client_config(&effective, defaults)?;
    // No page to linger on between sign-in and the next command.
    client.redirect_delay = Duration::ZERO;
    Ok(client)
}

/// Username and password for the target, prompting for the password
/// when nothing is stored and a terminal is attached.
pub fn resolve_credentials(
    target: &Target,
    global: &GlobalOpts,
) -> Result<(String, SecretString), CliError> {
    let username = match global.username {
        Some(ref name) => name.clone(),
        None => stratus_config::resolve_username(&target.profile, &target.profile_name)?,
    };

    let password = match stratus_config::resolve_password(&target.profile, &target.profile_name)
    {
        Ok(password) => password,
        Err(ConfigError::NoCredentials { .. }) if std::io::stdin().is_terminal() => {
            prompt_password(&username)?
        }
        Err(e) => return Err(e.into()),
    };

    Ok((username, password))
}

/// Read a password from the terminal without echo.
pub fn prompt_password(username: &str) -> Result<SecretString, CliError> {
    let entered = rpassword::prompt_password(format!("Password for {username}: "))?;
    Ok(SecretString::from(entered))
}
