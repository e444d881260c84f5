//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use stratus_config::ConfigError;
use stratus_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the storage server")]
    #[diagnostic(
        code(stratus::connection_failed),
        help(
            "Check that the server is running and accessible.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try: stratus --insecure whoami"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(stratus::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Sign-in refused: {detail}")]
    #[diagnostic(
        code(stratus::auth_failed),
        help(
            "Verify your username and password.\n\
             Store a new password with: stratus login --save --profile {profile}"
        )
    )]
    AuthFailed { profile: String, detail: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(stratus::no_credentials),
        help(
            "Configure credentials with: stratus config init\n\
             Or set STRATUS_USERNAME and STRATUS_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("Not signed in")]
    #[diagnostic(code(stratus::not_signed_in), help("Run: stratus login"))]
    NotSignedIn,

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(stratus::permission_denied),
        help("This action needs an administrator account.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(stratus::not_found),
        help("Run: stratus {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server answered HTTP {status}: {message}")]
    #[diagnostic(code(stratus::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected server reply: {message}")]
    #[diagnostic(code(stratus::bad_reply))]
    BadReply { message: String },

    #[error("{message}")]
    #[diagnostic(code(stratus::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stratus::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(stratus::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: stratus config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(stratus::no_config),
        help(
            "Create one with: stratus config init\n\
             Or pass --server.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(stratus::config))]
    Config(Box<ConfigError>),

    // ── Local side effects ───────────────────────────────────────────
    #[error("Cannot write {path}")]
    #[diagnostic(
        code(stratus::storage),
        help("Choose another directory with --dir.\nReason: {reason}")
    )]
    Storage { path: String, reason: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(stratus::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Operation cancelled")]
    #[diagnostic(code(stratus::cancelled))]
    Cancelled,

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::NotSignedIn => {
                exit_code::AUTH
            }
            Self::PermissionDenied { .. } | Self::Rejected { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate a core failure without taking ownership of it.
    ///
    /// Engine failures are published behind an `Arc`, so this is the path
    /// most commands take.
    pub fn from_core(err: &CoreError) -> Self {
        match err {
            CoreError::Communication { reason } => Self::ConnectionFailed {
                reason: reason.clone(),
            },
            CoreError::Timeout => Self::Timeout,
            CoreError::Cancelled => Self::Cancelled,
            CoreError::Deserialization { message } => Self::BadReply {
                message: message.clone(),
            },
            CoreError::Storage { path, source } => Self::Storage {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            CoreError::Unauthenticated => Self::NotSignedIn,
            CoreError::Rejected { message } => Self::Rejected {
                message: message.clone(),
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message.clone(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::from_core(&err)
    }
}

impl From<std::sync::Arc<CoreError>> for CliError {
    fn from(err: std::sync::Arc<CoreError>) -> Self {
        Self::from_core(&err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::Communication {
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Timeout, exit_code::TIMEOUT),
            (CoreError::Unauthenticated, exit_code::AUTH),
            (
                CoreError::Rejected {
                    message: "no".into(),
                },
                exit_code::PERMISSION,
            ),
            (
                CoreError::Storage {
                    path: PathBuf::from("/ro/file"),
                    source: std::io::Error::other("read-only"),
                },
                exit_code::GENERAL,
            ),
        ];

        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn config_credentials_error_is_auth() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "home".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(err.to_string().contains("home"));
    }
}
