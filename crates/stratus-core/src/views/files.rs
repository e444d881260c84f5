// File dashboard, per-file card and uploader.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use stratus_api::{FilePatch, StoredFile, UserFiles, endpoints};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::build_failure;
use crate::app::CloudApp;
use crate::engine::{
    DirectorySink, DownloadEngine, DownloadSink, HttpInit, RequestEngine, RequestMode,
    RequestOutcome,
};
use crate::error::CoreError;

// ── Dashboard ────────────────────────────────────────────────────────

fn listing_endpoint(app: &CloudApp, selected_user: Option<u64>) -> Option<String> {
    selected_user
        .or_else(|| app.session().user_id())
        .map(endpoints::user_files)
}

/// File listing of the signed-in user, or of `selected_user` when an
/// admin opened someone else's storage.
pub struct FileDashboard {
    app: CloudApp,
    engine: RequestEngine,
    selected_user: Option<u64>,
    shutdown: CancellationToken,
    watcher: Option<JoinHandle<()>>,
}

impl FileDashboard {
    pub fn new(app: &CloudApp, selected_user: Option<u64>) -> Self {
        Self {
            app: app.clone(),
            engine: app.request_engine(RequestMode::Json),
            selected_user,
            shutdown: CancellationToken::new(),
            watcher: None,
        }
    }

    fn endpoint(&self) -> Option<String> {
        listing_endpoint(&self.app, self.selected_user)
    }

    /// Start watching for staleness and load the listing.
    ///
    /// Nothing is fetched unless the session is authenticated.
    pub async fn mount(&mut self) -> RequestOutcome {
        if self.watcher.is_none() {
            let engine = self.engine.clone();
            let app = self.app.clone();
            let selected_user = self.selected_user;
            let handle = self
                .app
                .staleness()
                .watch_spawn(self.shutdown.clone(), move || {
                    let engine = engine.clone();
                    // Resolved per refetch: the session may sign in after mount.
                    let endpoint = listing_endpoint(&app, selected_user);
                    async move {
                        if let Some(endpoint) = endpoint {
                            engine.execute(&endpoint, HttpInit::get()).await;
                        }
                    }
                });
            self.watcher = Some(handle);
        }

        if !self.app.session().is_authenticated() {
            debug!("dashboard mounted without a session; not fetching");
            return RequestOutcome::Idle;
        }
        self.refresh().await
    }

    /// Re-issue the listing fetch.
    pub async fn refresh(&self) -> RequestOutcome {
        match self.endpoint() {
            Some(endpoint) => self.engine.execute(&endpoint, HttpInit::get()).await,
            None => build_failure(CoreError::Unauthenticated),
        }
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.engine.outcome()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestOutcome> {
        self.engine.subscribe()
    }

    /// The last successfully loaded listing.
    pub fn listing(&self) -> Option<UserFiles> {
        let outcome = self.engine.outcome();
        let state = outcome.state().filter(|s| s.status == 200)?;
        state.decode().ok()
    }

    pub fn selected_user(&self) -> Option<u64> {
        self.selected_user
    }

    /// Uploads go to the caller's own storage only.
    pub fn shows_uploader(&self) -> bool {
        self.selected_user.is_none()
    }
}

impl Drop for FileDashboard {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// ── File card ────────────────────────────────────────────────────────

/// Actions on one stored file.
///
/// Successful updates (`200`), downloads (`200`) and deletions (`204`)
/// mark the listings stale.
pub struct FileCard<S: DownloadSink = DirectorySink> {
    app: CloudApp,
    file: StoredFile,
    update: RequestEngine,
    remove: RequestEngine,
    download: DownloadEngine<S>,
}

impl FileCard {
    /// Card downloading into the configured download directory.
    pub fn new(app: &CloudApp, file: StoredFile) -> Self {
        let sink = DirectorySink::new(app.config().download_dir.clone());
        Self::with_sink(app, file, sink)
    }
}

impl<S: DownloadSink> FileCard<S> {
    pub fn with_sink(app: &CloudApp, file: StoredFile, sink: S) -> Self {
        Self {
            app: app.clone(),
            file,
            update: app.request_engine(RequestMode::Json),
            remove: app.request_engine(RequestMode::StatusOnly),
            download: app.download_engine_with(sink),
        }
    }

    pub fn file(&self) -> &StoredFile {
        &self.file
    }

    /// Public link for this file, if shared.
    pub fn share_url(&self) -> Option<String> {
        self.file.share_url(self.app.config().share_origin())
    }

    pub fn update_outcome(&self) -> RequestOutcome {
        self.update.outcome()
    }

    pub fn delete_outcome(&self) -> RequestOutcome {
        self.remove.outcome()
    }

    pub fn download_outcome(&self) -> RequestOutcome {
        self.download.outcome()
    }

    /// Where the last download of this file was written.
    pub fn last_download(&self) -> Option<PathBuf> {
        self.download.last_saved()
    }

    pub fn is_busy(&self) -> bool {
        self.update.is_loading() || self.remove.is_loading() || self.download.is_loading()
    }

    pub async fn rename(&self, filename: &str) -> RequestOutcome {
        self.patch(FilePatch::Rename {
            filename: filename.to_owned(),
        })
        .await
    }

    pub async fn edit_comment(&self, comment: &str) -> RequestOutcome {
        self.patch(FilePatch::Comment {
            comment: comment.to_owned(),
        })
        .await
    }

    /// Drop the public link.
    pub async fn revoke_link(&self) -> RequestOutcome {
        self.patch(FilePatch::revoke_link()).await
    }

    /// Ask the server for a new public link key.
    pub async fn generate_link(&self) -> RequestOutcome {
        let endpoint = endpoints::file_generate_link(self.file.id);
        let outcome = self.update.execute(&endpoint, HttpInit::post()).await;
        self.raise_on(&outcome, 200);
        outcome
    }

    pub async fn delete(&self) -> RequestOutcome {
        let endpoint = endpoints::file(self.file.id);
        let outcome = self.remove.execute(&endpoint, HttpInit::delete()).await;
        self.raise_on(&outcome, 204);
        outcome
    }

    /// Download the payload through the card's sink.
    pub async fn download(&self) -> RequestOutcome {
        let endpoint = endpoints::file_download(self.file.id);
        let outcome = self.download.execute(&endpoint).await;
        self.raise_on(&outcome, 200);
        outcome
    }

    async fn patch(&self, patch: FilePatch) -> RequestOutcome {
        let init = match HttpInit::patch().json(&patch) {
            Ok(init) => init,
            Err(e) => return build_failure(e),
        };
        let outcome = self.update.execute(&endpoints::file(self.file.id), init).await;
        self.raise_on(&outcome, 200);
        outcome
    }

    fn raise_on(&self, outcome: &RequestOutcome, status: u16) {
        if outcome.has_status(status) {
            self.app.staleness().raise();
        }
    }
}

// ── Uploader ─────────────────────────────────────────────────────────

/// Multipart upload into the signed-in user's storage.
pub struct Uploader {
    app: CloudApp,
    engine: RequestEngine,
}

impl Uploader {
    pub fn new(app: &CloudApp) -> Self {
        Self {
            app: app.clone(),
            engine: app.request_engine(RequestMode::Uploader),
        }
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.engine.outcome()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestOutcome> {
        self.engine.subscribe()
    }

    /// Upload `content` as `filename`. `201` marks the listings stale.
    ///
    /// Requires a signed-in user: the form names the owning account.
    pub async fn upload(
        &self,
        filename: &str,
        content: Vec<u8>,
        comment: &str,
    ) -> Result<RequestOutcome, CoreError> {
        let user_id = self
            .app
            .session()
            .user_id()
            .filter(|_| self.app.session().is_authenticated())
            .ok_or(CoreError::Unauthenticated)?;

        let form = Form::new()
            .part("content", Part::bytes(content).file_name(filename.to_owned()))
            .text("cloud_user", user_id.to_string())
            .text("comment", comment.to_owned());

        let init = HttpInit::post().multipart(form);
        let outcome = self.engine.execute(endpoints::FILE_UPLOAD, init).await;
        if outcome.has_status(201) {
            debug!(filename, "upload accepted");
            self.app.staleness().raise();
        }
        Ok(outcome)
    }

    /// Read a local file and upload it under its own name.
    pub async fn upload_path(&self, path: &Path, comment: &str) -> Result<RequestOutcome, CoreError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::Rejected {
                message: format!("{} has no usable file name", path.display()),
            })?
            .to_owned();
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| CoreError::Storage {
                path: path.to_path_buf(),
                source,
            })?;
        self.upload(&filename, content, comment).await
    }
}
