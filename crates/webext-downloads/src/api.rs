//! Per-extension downloads API
//!
//! Every async command resolves the id, forwards to the engine and leaves
//! any failure in the service's last-error slot before returning it.

use std::path::PathBuf;

use webext_engine::SessionRequest;

use crate::error::DownloadError;
use crate::events::CreatedListener;
use crate::extension::{ExtensionInfo, OPEN_PERMISSION};
use crate::item::{DownloadInfo, DownloadItem};
use crate::options::{
    best_effort_file_name, parse_source_url, relative_target, DownloadOptions, DownloadQuery,
    FileIconOptions,
};
use crate::registry::DownloadId;
use crate::service::DownloadService;
use crate::Result;

#[derive(Clone)]
pub struct ExtensionDownloads {
    service: DownloadService,
    extension: ExtensionInfo,
}

impl ExtensionDownloads {
    pub(crate) fn new(service: DownloadService, extension: ExtensionInfo) -> Self {
        Self { service, extension }
    }

    pub fn extension(&self) -> &ExtensionInfo {
        &self.extension
    }

    pub fn last_error(&self) -> Option<DownloadError> {
        self.service.last_error().get()
    }

    /// Start a download and return its id
    pub async fn download(&self, options: DownloadOptions) -> Result<DownloadId> {
        let result = self.start_download(options).await;
        self.service.record(result)
    }

    async fn start_download(&self, options: DownloadOptions) -> Result<DownloadId> {
        let url = parse_source_url(&options.url)?;
        let file_name = match options.filename.as_deref() {
            Some(filename) => relative_target(filename)?,
            None => PathBuf::from(best_effort_file_name(&url)),
        };

        if options.conflict_action.is_some() || options.save_as.is_some() {
            tracing::debug!(
                conflict_action = ?options.conflict_action,
                save_as = ?options.save_as,
                "Ignoring download options handled by the engine"
            );
        }

        let dir = self.service.download_directory().await?;
        let session = self
            .service
            .engine()
            .create_session(SessionRequest {
                source: url.to_string(),
                target: dir.join(file_name),
            })
            .await?;
        session.set_retain_partial_data(self.service.config().retain_partial_data);

        // Register before starting so views find the owner on first sight
        let id = self
            .service
            .registry()
            .create(session.clone(), Some(self.extension.clone()));

        tracing::info!(
            download_id = %id,
            extension_id = %self.extension.id,
            url = %url,
            "Created download"
        );

        // A download that never started has no id worth keeping
        if let Err(error) = session.start().await {
            let _ = self.service.registry().remove(id);
            tracing::warn!(download_id = %id, error = %error, "Download failed to start");
            return Err(error.into());
        }

        Ok(id)
    }

    /// Stop the transfer, keeping partial data for `resume`
    pub async fn pause(&self, id: DownloadId) -> Result<()> {
        let result = async {
            let entry = self.service.registry().resolve(id)?;
            entry.session.cancel().await?;
            tracing::info!(download_id = %id, "Paused download");
            Ok::<_, DownloadError>(())
        }
        .await;
        self.service.record(result)
    }

    pub async fn resume(&self, id: DownloadId) -> Result<()> {
        let result = async {
            let entry = self.service.registry().resolve(id)?;
            entry.session.start().await?;
            tracing::info!(download_id = %id, "Resumed download");
            Ok::<_, DownloadError>(())
        }
        .await;
        self.service.record(result)
    }

    /// Stop for good and forget the id. The id is gone even if the engine
    /// fails to finalize.
    pub async fn cancel(&self, id: DownloadId) -> Result<()> {
        let result = async {
            let entry = self.service.registry().remove(id)?;
            tracing::info!(download_id = %id, "Canceled download");
            entry.session.finalize(true).await?;
            Ok::<_, DownloadError>(())
        }
        .await;
        self.service.record(result)
    }

    /// Delete the downloaded file from disk
    pub async fn remove_file(&self, id: DownloadId) -> Result<()> {
        let result = async {
            let entry = self.service.registry().resolve(id)?;
            let snapshot = entry.session.snapshot();
            if !snapshot.succeeded {
                return Err(DownloadError::DownloadNotComplete(id));
            }
            self.service
                .engine()
                .remove_file(&snapshot.target_path)
                .await?;
            tracing::info!(download_id = %id, "Removed downloaded file");
            Ok::<_, DownloadError>(())
        }
        .await;
        self.service.record(result)
    }

    /// Open the finished file. Failures only reach the last-error slot.
    pub async fn open(&self, id: DownloadId) {
        let result = async {
            if !self.extension.has_permission(OPEN_PERMISSION) {
                return Err(DownloadError::PermissionDenied(OPEN_PERMISSION));
            }
            let entry = self.service.registry().resolve(id)?;
            if !entry.session.snapshot().succeeded {
                return Err(DownloadError::DownloadNotComplete(id));
            }
            entry.session.launch().await?;
            Ok::<_, DownloadError>(())
        }
        .await;
        let _ = self.service.record(result);
    }

    /// Reveal the file in its folder. Failures only reach the last-error slot.
    pub async fn show(&self, id: DownloadId) {
        let result = async {
            let entry = self.service.registry().resolve(id)?;
            entry.session.show_containing_directory().await?;
            Ok::<_, DownloadError>(())
        }
        .await;
        let _ = self.service.record(result);
    }

    pub async fn show_default_folder(&self) {
        let result = async {
            let dir = self.service.download_directory().await?;
            self.service.engine().show_directory(&dir).await?;
            Ok::<_, DownloadError>(())
        }
        .await;
        let _ = self.service.record(result);
    }

    /// Live view of a download
    pub fn item(&self, id: DownloadId) -> Result<DownloadItem> {
        self.service.item(id)
    }

    pub fn info(&self, id: DownloadId) -> Result<DownloadInfo> {
        self.item(id)?.info()
    }

    /// Subscribe to downloads created from now on
    pub async fn on_created(&self) -> Result<CreatedListener> {
        let result =
            CreatedListener::subscribe(self.service.engine().clone(), self.service.registry().clone())
                .await;
        self.service.record(result)
    }

    pub fn search(&self, _query: &DownloadQuery) -> Result<Vec<DownloadInfo>> {
        not_implemented("search")
    }

    pub fn erase(&self, _query: &DownloadQuery) -> Result<Vec<DownloadId>> {
        not_implemented("erase")
    }

    pub fn get_file_icon(&self, _id: DownloadId, _options: FileIconOptions) -> Result<String> {
        not_implemented("getFileIcon")
    }

    pub fn accept_danger(&self, _id: DownloadId) -> Result<()> {
        not_implemented("acceptDanger")
    }

    pub fn drag(&self, _id: DownloadId) -> Result<()> {
        not_implemented("drag")
    }

    /// There is no download shelf to toggle
    pub fn set_shelf_enabled(&self, enabled: bool) {
        tracing::debug!(enabled, "Ignoring setShelfEnabled");
    }
}

fn not_implemented<T>(name: &'static str) -> Result<T> {
    tracing::warn!(method = name, "Unimplemented downloads method called");
    Err(DownloadError::NotImplemented(name))
}
