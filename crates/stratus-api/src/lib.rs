// stratus-api: HTTP plumbing for the Stratus cloud file-storage REST API

pub mod client;
mod csrf;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ApiClient;
pub use csrf::{CSRF_HEADER, NULL_TOKEN};
pub use error::Error;
pub use models::{
    CloudUser, FieldErrors, FilePatch, SessionInfo, StoredFile, UserFiles, UserPatch,
};
pub use transport::{TlsMode, TransportConfig};
