//! Request payloads accepted from extensions

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::error::DownloadError;
use crate::item::DownloadState;
use crate::registry::DownloadId;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    Uniquify,
    Overwrite,
    Prompt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOptions {
    pub url: String,
    /// Path relative to the downloads directory
    #[serde(default, alias = "target")]
    pub filename: Option<String>,
    #[serde(default)]
    pub conflict_action: Option<ConflictAction>,
    #[serde(default)]
    pub save_as: Option<bool>,
}

impl DownloadOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Filter for `search` and `erase`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub id: Option<DownloadId>,
    pub url: Option<String>,
    pub state: Option<DownloadState>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIconOptions {
    pub size: Option<u32>,
}

pub(crate) fn parse_source_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| DownloadError::InvalidUrl(format!("{url}: {e}")))
}

/// Accept only plain relative paths that stay inside the downloads directory
pub(crate) fn relative_target(filename: &str) -> Result<PathBuf> {
    let path = Path::new(filename);
    let mut clean = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DownloadError::InvalidFilename(filename.to_string()));
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(DownloadError::InvalidFilename(filename.to_string()));
    }

    Ok(clean)
}

pub(crate) fn best_effort_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut s| s.next_back())
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("download")
        .to_string()
}
