//! REST paths exposed by the storage service.
//!
//! Paths are relative to the configured server URL and always carry the
//! trailing slash the backend router expects.

pub const CSRF: &str = "/api/csrf/";
pub const SESSION: &str = "/api/session/";
pub const LOGIN: &str = "/api/login/";
pub const LOGOUT: &str = "/api/logout/";
pub const REGISTRATION: &str = "/api/users/registration/";
pub const USERS: &str = "/api/users/";
pub const FILE_UPLOAD: &str = "/api/files/upload/";

/// `DELETE` / `PATCH` target for a single account.
pub fn user(id: u64) -> String {
    format!("/api/users/{id}/")
}

/// The file listing of one account.
pub fn user_files(id: u64) -> String {
    format!("/api/userfiles/{id}/")
}

/// `PATCH` / `DELETE` target for a single stored file.
pub fn file(id: u64) -> String {
    format!("/api/files/{id}/")
}

pub fn file_download(id: u64) -> String {
    format!("/api/files/{id}/download/")
}

pub fn file_generate_link(id: u64) -> String {
    format!("/api/files/{id}/generatelink/")
}

/// Public share path for an external link key (served by the front-end
/// origin, not under `/api/`).
pub fn shared_file(key: &str) -> String {
    format!("/f/{key}")
}
