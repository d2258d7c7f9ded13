//! Hosting service for the downloads API

use std::path::PathBuf;
use std::sync::Arc;

use webext_engine::DownloadEngine;

use crate::api::ExtensionDownloads;
use crate::config::DownloadsConfig;
use crate::extension::ExtensionInfo;
use crate::item::DownloadItem;
use crate::last_error::LastError;
use crate::registry::{DownloadId, Registry};
use crate::Result;

/// Owns the registry and the engine handle shared by every extension.
///
/// Cloning is cheap; clones share all state.
#[derive(Clone)]
pub struct DownloadService {
    engine: Arc<dyn DownloadEngine>,
    registry: Registry,
    config: Arc<DownloadsConfig>,
    last_error: LastError,
}

impl DownloadService {
    pub fn new(engine: Arc<dyn DownloadEngine>, config: DownloadsConfig) -> Self {
        Self {
            engine,
            registry: Registry::new(),
            config: Arc::new(config),
            last_error: LastError::new(),
        }
    }

    /// API surface bound to one calling extension
    pub fn for_extension(&self, extension: ExtensionInfo) -> ExtensionDownloads {
        tracing::debug!(extension_id = %extension.id, "Binding downloads API");
        ExtensionDownloads::new(self.clone(), extension)
    }

    pub fn engine(&self) -> &Arc<dyn DownloadEngine> {
        &self.engine
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DownloadsConfig {
        &self.config
    }

    pub fn last_error(&self) -> &LastError {
        &self.last_error
    }

    pub fn item(&self, id: DownloadId) -> Result<DownloadItem> {
        self.registry.resolve(id)?;
        Ok(DownloadItem::new(id, self.registry.clone()))
    }

    /// Configured directory, falling back to the engine's preference
    pub(crate) async fn download_directory(&self) -> Result<PathBuf> {
        match &self.config.download_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.engine.preferred_directory().await?),
        }
    }

    /// Leave failures in the last-error slot on their way out
    pub(crate) fn record<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.last_error.record(e);
        }
        result
    }
}
