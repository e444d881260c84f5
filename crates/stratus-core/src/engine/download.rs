// ── Binary download engine ──
//
// Fetches a file payload and hands it to a `DownloadSink` under the name
// the server advertises. The published state is always status-only.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use reqwest::{Method, StatusCode};
use stratus_api::ApiClient;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::tracker::Tracker;
use super::{RequestOutcome, RequestState};
use crate::error::CoreError;

/// Name used when the response advertises none.
const FALLBACK_FILENAME: &str = "download";

// ── Sink ─────────────────────────────────────────────────────────────

/// Destination for downloaded payloads.
pub trait DownloadSink: Send + Sync + 'static {
    /// Persist `payload` under `filename` and return where it ended up.
    ///
    /// `filename` is already stripped of path components.
    fn save(
        &self,
        filename: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<PathBuf, CoreError>> + Send;
}

/// Writes downloads into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    async fn save(&self, filename: &str, payload: Bytes) -> Result<PathBuf, CoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CoreError::Storage {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(sanitize_filename(filename));
        tokio::fs::write(&path, &payload)
            .await
            .map_err(|source| CoreError::Storage {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

// ── Filename resolution ──────────────────────────────────────────────

/// Pick the payload's filename from response headers.
///
/// Order: the backend's `filename` header, then the `filename="..."`
/// parameter of `Content-Disposition`, then `download`. Whatever is found
/// is reduced to its final path component.
pub fn filename_from_headers(headers: &HeaderMap) -> String {
    let explicit = headers
        .get("filename")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().trim_matches('"').to_owned());

    let disposition = || {
        headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename)
    };

    explicit
        .filter(|name| !name.is_empty())
        .or_else(disposition)
        .map_or_else(|| FALLBACK_FILENAME.to_owned(), |name| sanitize_filename(&name))
}

fn disposition_filename(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))
        .map(|name| name.trim().trim_matches('"').to_owned())
        .filter(|name| !name.is_empty())
}

fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => FALLBACK_FILENAME.to_owned(),
        other => other.to_owned(),
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// Downloads files through a [`DownloadSink`].
pub struct DownloadEngine<S: DownloadSink = DirectorySink> {
    inner: Arc<DownloadInner<S>>,
}

struct DownloadInner<S> {
    api: Arc<ApiClient>,
    sink: S,
    tracker: Arc<Tracker>,
    last_saved: watch::Sender<Option<PathBuf>>,
}

impl<S: DownloadSink> Clone for DownloadEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DownloadSink> DownloadEngine<S> {
    pub fn new(api: Arc<ApiClient>, sink: S, ttl: Duration) -> Self {
        let (last_saved, _) = watch::channel(None);
        Self {
            inner: Arc::new(DownloadInner {
                api,
                sink,
                tracker: Tracker::new(ttl),
                last_saved,
            }),
        }
    }

    pub fn sink(&self) -> &S {
        &self.inner.sink
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.inner.tracker.outcome()
    }

    pub fn is_loading(&self) -> bool {
        self.outcome().is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestOutcome> {
        self.inner.tracker.subscribe()
    }

    /// Where the most recent successful download was written.
    pub fn last_saved(&self) -> Option<PathBuf> {
        self.inner.last_saved.borrow().clone()
    }

    pub fn cancel(&self) {
        self.inner.tracker.cancel_current();
    }

    /// Fetch `endpoint` and, on `200`, save the payload.
    ///
    /// Any other status settles without touching the sink, so callers can
    /// render "file not found" from the status alone.
    pub async fn execute(&self, endpoint: &str) -> RequestOutcome {
        let tracker = &self.inner.tracker;
        let call = tracker.begin();
        let token = call.token().clone();

        let result = tokio::select! {
            () = token.cancelled() => None,
            res = self.perform(endpoint) => Some(res),
        };

        match result {
            None => {
                tracker.abandon(&call);
                RequestOutcome::Failed(Arc::new(CoreError::Cancelled))
            }
            Some(Ok(state)) => {
                tracker.settle(&call, state.clone(), false);
                RequestOutcome::Settled(state)
            }
            Some(Err(err)) => {
                warn!(endpoint, error = %err, "download failed");
                let err = Arc::new(err);
                tracker.fail(&call, Arc::clone(&err));
                RequestOutcome::Failed(err)
            }
        }
    }

    async fn perform(&self, endpoint: &str) -> Result<RequestState, CoreError> {
        let resp = self
            .inner
            .api
            .request(Method::GET, endpoint)?
            .send()
            .await
            .map_err(stratus_api::Error::from)?;
        let status = resp.status();

        if status == StatusCode::OK {
            let filename = filename_from_headers(resp.headers());
            let payload = resp.bytes().await.map_err(stratus_api::Error::from)?;
            let size = payload.len();
            let path = self.inner.sink.save(&filename, payload).await?;
            debug!(path = %path.display(), size, "download saved");
            self.inner.last_saved.send_replace(Some(path));
        } else {
            debug!(endpoint, status = status.as_u16(), "download refused");
        }

        Ok(RequestState::status_only(status.as_u16()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn filename_header_wins() {
        let map = headers(&[
            ("filename", "report.pdf"),
            ("content-disposition", "attachment; filename=\"other.pdf\""),
        ]);
        assert_eq!(filename_from_headers(&map), "report.pdf");
    }

    #[test]
    fn falls_back_to_content_disposition() {
        let map = headers(&[("content-disposition", "attachment; filename=\"notes.txt\"")]);
        assert_eq!(filename_from_headers(&map), "notes.txt");
    }

    #[test]
    fn falls_back_to_default_name() {
        assert_eq!(filename_from_headers(&HeaderMap::new()), "download");
        let map = headers(&[("filename", "\"\"")]);
        assert_eq!(filename_from_headers(&map), "download");
    }

    #[test]
    fn path_components_are_stripped() {
        let map = headers(&[("filename", "../../etc/passwd")]);
        assert_eq!(filename_from_headers(&map), "passwd");
        let map = headers(&[("filename", "C:\\temp\\a.bin")]);
        assert_eq!(filename_from_headers(&map), "a.bin");
        let map = headers(&[("filename", "..")]);
        assert_eq!(filename_from_headers(&map), "download");
    }

    #[tokio::test]
    async fn directory_sink_writes_inside_its_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("nested"));
        let path = sink
            .save("a.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("nested").join("a.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }
}
