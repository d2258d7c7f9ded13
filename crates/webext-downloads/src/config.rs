//! Downloads API configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DownloadError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Overrides the engine's preferred downloads directory
    pub download_dir: Option<PathBuf>,
    /// Keep received bytes when a download is paused or interrupted
    pub retain_partial_data: bool,
}

impl DownloadsConfig {
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            download_dir: Some(download_dir),
            ..Self::default()
        }
    }

    /// Parse a preferences blob as stored in the settings table
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DownloadError::Config(e.to_string()))
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            retain_partial_data: true,
        }
    }
}
