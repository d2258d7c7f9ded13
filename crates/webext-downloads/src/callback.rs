//! Callback-style adapter
//!
//! For callers that expect each command to invoke a callback once instead
//! of returning a future. Results arrive as `Option`; `None` means the call
//! failed and the error is in the last-error slot. Must be used from within
//! a tokio runtime.

use crate::api::ExtensionDownloads;
use crate::item::DownloadInfo;
use crate::options::{DownloadOptions, DownloadQuery, FileIconOptions};
use crate::registry::DownloadId;
use crate::Result;

#[derive(Clone)]
pub struct CallbackDownloads {
    inner: ExtensionDownloads,
}

impl CallbackDownloads {
    pub fn new(inner: ExtensionDownloads) -> Self {
        Self { inner }
    }

    pub fn download<F>(&self, options: DownloadOptions, callback: F)
    where
        F: FnOnce(Option<DownloadId>) + Send + 'static,
    {
        let api = self.inner.clone();
        tokio::spawn(async move {
            callback(api.download(options).await.ok());
        });
    }

    pub fn pause<F>(&self, id: DownloadId, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let api = self.inner.clone();
        tokio::spawn(async move {
            let _ = api.pause(id).await;
            callback();
        });
    }

    pub fn resume<F>(&self, id: DownloadId, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let api = self.inner.clone();
        tokio::spawn(async move {
            let _ = api.resume(id).await;
            callback();
        });
    }

    pub fn cancel<F>(&self, id: DownloadId, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let api = self.inner.clone();
        tokio::spawn(async move {
            let _ = api.cancel(id).await;
            callback();
        });
    }

    pub fn remove_file<F>(&self, id: DownloadId, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let api = self.inner.clone();
        tokio::spawn(async move {
            let _ = api.remove_file(id).await;
            callback();
        });
    }

    pub fn open(&self, id: DownloadId) {
        let api = self.inner.clone();
        tokio::spawn(async move { api.open(id).await });
    }

    pub fn show(&self, id: DownloadId) {
        let api = self.inner.clone();
        tokio::spawn(async move { api.show(id).await });
    }

    pub fn show_default_folder(&self) {
        let api = self.inner.clone();
        tokio::spawn(async move { api.show_default_folder().await });
    }

    pub fn search(&self, query: &DownloadQuery) -> Result<Vec<DownloadInfo>> {
        self.inner.search(query)
    }

    pub fn erase(&self, query: &DownloadQuery) -> Result<Vec<DownloadId>> {
        self.inner.erase(query)
    }

    pub fn get_file_icon(&self, id: DownloadId, options: FileIconOptions) -> Result<String> {
        self.inner.get_file_icon(id, options)
    }

    pub fn accept_danger(&self, id: DownloadId) -> Result<()> {
        self.inner.accept_danger(id)
    }

    pub fn drag(&self, id: DownloadId) -> Result<()> {
        self.inner.drag(id)
    }

    pub fn set_shelf_enabled(&self, enabled: bool) {
        self.inner.set_shelf_enabled(enabled)
    }
}

impl From<ExtensionDownloads> for CallbackDownloads {
    fn from(inner: ExtensionDownloads) -> Self {
        Self::new(inner)
    }
}
