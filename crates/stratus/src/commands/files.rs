//! File command handlers.

use bytesize::ByteSize;
use tabled::Tabled;
use url::Url;

use stratus_core::{
    CloudApp, DirectorySink, DownloadSink, FileCard, FileDashboard, StoredFile, Uploader,
    UserFiles,
};

use crate::cli::{FilesArgs, FilesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Comment")]
    comment: String,
    #[tabled(rename = "Uploaded")]
    uploaded: String,
    #[tabled(rename = "Last download")]
    last_download: String,
    #[tabled(rename = "Share link")]
    share: String,
}

impl FileRow {
    fn new(file: &StoredFile, origin: &Url) -> Self {
        Self {
            id: file.id,
            name: file.filename.clone(),
            size: ByteSize::b(file.size).to_string(),
            comment: file.comment.clone(),
            uploaded: util::format_time(file.date_uploaded.as_ref()),
            last_download: util::format_time(file.last_download.as_ref()),
            share: file.share_url(origin).unwrap_or_default(),
        }
    }
}

// ── Lookups ─────────────────────────────────────────────────────────

fn file_not_found(id: u64) -> CliError {
    CliError::NotFound {
        resource_type: "file".into(),
        identifier: id.to_string(),
        list_command: "files list".into(),
    }
}

fn user_not_found(user: Option<u64>) -> CliError {
    CliError::NotFound {
        resource_type: "user".into(),
        identifier: user.map(|id| id.to_string()).unwrap_or_default(),
        list_command: "users list".into(),
    }
}

/// Fetch the listing once, without watching for changes.
async fn fetch_listing(app: &CloudApp, user: Option<u64>) -> Result<UserFiles, CliError> {
    let dashboard = FileDashboard::new(app, user);
    let state = util::require_status(dashboard.refresh().await, 200, || user_not_found(user))?;
    Ok(state.decode()?)
}

async fn find_file(app: &CloudApp, user: Option<u64>, id: u64) -> Result<StoredFile, CliError> {
    fetch_listing(app, user)
        .await?
        .files
        .into_iter()
        .find(|f| f.id == id)
        .ok_or_else(|| file_not_found(id))
}

async fn download_with<S: DownloadSink>(
    card: FileCard<S>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = card.file().id;
    util::require_status(card.download().await, 200, || file_not_found(id))?;
    let saved = card
        .last_download()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    output::success(global, &format!("Saved {saved}"));
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(app: &CloudApp, args: FilesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let user = args.user;

    match args.command {
        FilesCommand::List => {
            let mut dashboard = FileDashboard::new(app, user);
            let outcome = dashboard.mount().await;
            let state = util::require_status(outcome, 200, || user_not_found(user))?;
            let listing: UserFiles = state.decode()?;

            let origin = app.config().share_origin().clone();
            let out = output::render_list(
                &global.output,
                &listing.files,
                |f| FileRow::new(f, &origin),
                |f| f.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FilesCommand::Upload { path, comment } => {
            if user.is_some() {
                return Err(CliError::Validation {
                    field: "user".into(),
                    reason: "uploads always go to your own storage".into(),
                });
            }
            let outcome = Uploader::new(app).upload_path(&path, &comment).await?;
            let state = util::require_status(outcome, 201, || CliError::ApiError {
                status: 404,
                message: "upload endpoint not found".into(),
            })?;
            match state.decode::<StoredFile>() {
                Ok(file) => output::success(
                    global,
                    &format!("Uploaded {} as file {}", file.filename, file.id),
                ),
                Err(_) => output::success(global, &format!("Uploaded {}", path.display())),
            }
            Ok(())
        }

        FilesCommand::Rename { id, name } => {
            let card = FileCard::new(app, find_file(app, user, id).await?);
            util::require_status(card.rename(&name).await, 200, || file_not_found(id))?;
            output::success(global, &format!("Renamed file {id} to {name}"));
            Ok(())
        }

        FilesCommand::Comment { id, text } => {
            let card = FileCard::new(app, find_file(app, user, id).await?);
            util::require_status(card.edit_comment(&text).await, 200, || {
                file_not_found(id)
            })?;
            output::success(global, &format!("Updated comment of file {id}"));
            Ok(())
        }

        FilesCommand::Share { id } => {
            let card = FileCard::new(app, find_file(app, user, id).await?);
            let state =
                util::require_status(card.generate_link().await, 200, || file_not_found(id))?;
            let key = state
                .result
                .as_ref()
                .and_then(|body| body.get("external_link_key"))
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| CliError::BadReply {
                    message: "reply carries no external_link_key".into(),
                })?;

            let mut shared = card.file().clone();
            shared.external_link_key = key.to_owned();
            let url = shared
                .share_url(app.config().share_origin())
                .unwrap_or_default();
            output::print_output(&url, global.quiet);
            Ok(())
        }

        FilesCommand::Unshare { id } => {
            let card = FileCard::new(app, find_file(app, user, id).await?);
            util::require_status(card.revoke_link().await, 200, || file_not_found(id))?;
            output::success(global, &format!("Revoked share link of file {id}"));
            Ok(())
        }

        FilesCommand::Delete { id } => {
            let file = find_file(app, user, id).await?;
            if !util::confirm(
                &format!("Delete file '{}'? This cannot be undone.", file.filename),
                "files delete",
                global.yes,
            )? {
                return Ok(());
            }
            let card = FileCard::new(app, file);
            util::require_status(card.delete().await, 204, || file_not_found(id))?;
            output::success(global, &format!("Deleted file {id}"));
            Ok(())
        }

        FilesCommand::Download { id, dir } => {
            let file = find_file(app, user, id).await?;
            match dir {
                Some(dir) => {
                    let card = FileCard::with_sink(app, file, DirectorySink::new(dir));
                    download_with(card, global).await
                }
                None => download_with(FileCard::new(app, file), global).await,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stored(key: &str) -> StoredFile {
        StoredFile {
            id: 4,
            cloud_user: Some(2),
            filename: "notes.txt".into(),
            size: 2048,
            comment: "draft".into(),
            date_uploaded: None,
            last_download: None,
            external_link_key: key.into(),
        }
    }

    #[test]
    fn row_shows_share_link_only_when_shared() {
        let origin: Url = "https://cloud.example.com".parse().unwrap();
        assert_eq!(FileRow::new(&stored(""), &origin).share, "");
        assert_eq!(
            FileRow::new(&stored("abc"), &origin).share,
            "https://cloud.example.com/f/abc"
        );
    }

    #[test]
    fn row_formats_size() {
        let origin: Url = "https://cloud.example.com".parse().unwrap();
        let row = FileRow::new(&stored(""), &origin);
        assert_eq!(row.size, ByteSize::b(2048).to_string());
    }
}
