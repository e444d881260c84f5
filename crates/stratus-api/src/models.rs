// Storage service wire types
//
// Field names follow the backend serializers verbatim (`is_superuser`,
// `date_uploaded`, ...) except the session/login replies, which the backend
// emits in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::endpoints;

/// A file stored in a user's cloud directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: u64,
    /// Owning account. Omitted by some serializers.
    #[serde(default)]
    pub cloud_user: Option<u64>,
    pub filename: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date_uploaded: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_download: Option<DateTime<Utc>>,
    /// Empty when the file has no public link.
    #[serde(default)]
    pub external_link_key: String,
}

impl StoredFile {
    /// Whether a public share link currently exists.
    pub fn is_shared(&self) -> bool {
        !self.external_link_key.is_empty()
    }

    /// Public share URL under the given front-end origin, if the file is shared.
    pub fn share_url(&self, origin: &Url) -> Option<String> {
        if !self.is_shared() {
            return None;
        }
        let base = origin.as_str().trim_end_matches('/');
        Some(format!(
            "{base}{}",
            endpoints::shared_file(&self.external_link_key)
        ))
    }
}

/// An account as listed in the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub files: Vec<StoredFile>,
}

impl CloudUser {
    /// Total bytes held by this account.
    pub fn storage_used(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Body of `GET /api/userfiles/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFiles {
    pub username: String,
    #[serde(default)]
    pub files: Vec<StoredFile>,
}

/// Identity returned by the session probe and by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "userID")]
    pub user_id: u64,
    pub username: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

/// Validation payload of a 400 response.
///
/// Django REST framework reports one array of messages per rejected field,
/// plus a free-form `detail` for non-field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub username: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub password: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
            && self.password.is_empty()
            && self.email.is_empty()
            && self.content.is_empty()
            && self.detail.is_none()
    }

    /// Flatten into `(field, message)` pairs, in form order.
    pub fn messages(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        for (field, list) in [
            ("username", &self.username),
            ("password", &self.password),
            ("email", &self.email),
            ("content", &self.content),
        ] {
            out.extend(list.iter().map(|m| (field, m.as_str())));
        }
        if let Some(ref detail) = self.detail {
            out.push(("detail", detail.as_str()));
        }
        out
    }
}

/// `PATCH /api/files/{id}/` bodies. Exactly one field per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilePatch {
    Rename { filename: String },
    Comment { comment: String },
    /// Revoke the public link (the backend clears it on an empty key).
    RevokeLink { external_link_key: String },
}

impl FilePatch {
    pub fn revoke_link() -> Self {
        Self::RevokeLink {
            external_link_key: String::new(),
        }
    }
}

/// `PATCH /api/users/{id}/` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    pub is_superuser: bool,
}
