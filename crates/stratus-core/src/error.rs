// ── Core error types ──
//
// Failures the request engines absorb and publish as observable state.
// HTTP status codes are NOT errors here: a 400 or 404 is a settled
// request with a status. Only failures that leave no response behind
// (or no usable one) become a `CoreError`.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Communication ────────────────────────────────────────────────
    #[error("Cannot reach the storage server: {reason}")]
    Communication { reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Request was cancelled")]
    Cancelled,

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Unexpected response body: {message}")]
    Deserialization { message: String },

    // ── Local side effects ───────────────────────────────────────────
    #[error("Cannot write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Preconditions ────────────────────────────────────────────────
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Operation rejected: {message}")]
    Rejected { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Whether this is the generic "communication error" the UI surfaces
    /// as a transient banner.
    pub fn is_communication(&self) -> bool {
        matches!(self, Self::Communication { .. } | Self::Timeout)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<stratus_api::Error> for CoreError {
    fn from(err: stratus_api::Error) -> Self {
        match err {
            stratus_api::Error::Transport(ref e) if e.is_timeout() => CoreError::Timeout,
            stratus_api::Error::Transport(e) => {
                if e.is_decode() {
                    CoreError::Deserialization {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::Communication {
                        reason: e.to_string(),
                    }
                }
            }
            stratus_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            stratus_api::Error::Tls(msg) => CoreError::Communication {
                reason: format!("TLS error: {msg}"),
            },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Deserialization {
            message: err.to_string(),
        }
    }
}
