//! Shared helpers for command handlers.

use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use stratus_core::{RequestOutcome, RequestState, failure_message};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// The settled state of a finished request, or the failure behind it.
pub fn settled(outcome: RequestOutcome) -> Result<RequestState, CliError> {
    match outcome {
        RequestOutcome::Settled(state) => Ok(state),
        RequestOutcome::Failed(err) => Err(err.into()),
        RequestOutcome::Idle | RequestOutcome::Pending => Err(CliError::Cancelled),
    }
}

/// Require `expected`, translating the usual refusals.
///
/// `404` becomes whatever `not_found` builds; `401`/`403` become a
/// permission error carrying the server's message.
pub fn require_status(
    outcome: RequestOutcome,
    expected: u16,
    not_found: impl FnOnce() -> CliError,
) -> Result<RequestState, CliError> {
    let state = settled(outcome)?;
    match state.status {
        s if s == expected => Ok(state),
        404 => Err(not_found()),
        401 | 403 => Err(CliError::PermissionDenied {
            message: failure_message(&state),
        }),
        status => Err(CliError::ApiError {
            status,
            message: failure_message(&state),
        }),
    }
}

/// Table-friendly timestamp, blank when absent.
pub fn format_time(at: Option<&DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
