//! Download item view
//!
//! A [`DownloadItem`] holds nothing but an id. Every attribute is computed
//! from a fresh engine snapshot at read time, so engine-side changes show up
//! immediately and a canceled id stops resolving.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use webext_engine::SessionSnapshot;

use crate::extension::ExtensionInfo;
use crate::registry::{DownloadId, Registry, RegistryEntry};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    InProgress,
    Interrupted,
    Complete,
}

impl DownloadState {
    pub fn from_flags(succeeded: bool, stopped: bool) -> Self {
        if succeeded {
            DownloadState::Complete
        } else if stopped {
            DownloadState::Interrupted
        } else {
            DownloadState::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::InProgress => "in_progress",
            DownloadState::Interrupted => "interrupted",
            DownloadState::Complete => "complete",
        }
    }
}

/// Why an interrupted download stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterruptReason {
    NetworkFailed,
    FileFailed,
    UserCanceled,
    Crash,
}

impl InterruptReason {
    /// `None` unless the session stopped without succeeding
    pub fn classify(snapshot: &SessionSnapshot) -> Option<Self> {
        if !snapshot.stopped || snapshot.succeeded {
            return None;
        }

        Some(match &snapshot.error {
            Some(e) if e.because_source_failed() => InterruptReason::NetworkFailed,
            Some(e) if e.because_target_failed() => InterruptReason::FileFailed,
            Some(_) => InterruptReason::Crash,
            None => InterruptReason::UserCanceled,
        })
    }
}

/// No file-type analysis is done; every download reports `safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerType {
    #[default]
    Safe,
}

/// Serializable snapshot of a download in the shape extensions receive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadInfo {
    pub id: DownloadId,
    pub url: String,
    pub referrer: Option<String>,
    pub localname: PathBuf,
    pub incognito: bool,
    pub danger: DangerType,
    pub mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub estimated_end_time: Option<String>,
    pub state: DownloadState,
    pub can_resume: bool,
    pub error: Option<InterruptReason>,
    pub bytes_received: u64,
    pub total_bytes: i64,
    pub file_size: i64,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_extension_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_extension_name: Option<String>,
}

impl DownloadInfo {
    fn project(id: DownloadId, snapshot: SessionSnapshot, owner: Option<&ExtensionInfo>) -> Self {
        Self {
            id,
            state: DownloadState::from_flags(snapshot.succeeded, snapshot.stopped),
            can_resume: can_resume(&snapshot),
            error: InterruptReason::classify(&snapshot),
            total_bytes: total_bytes(&snapshot),
            file_size: file_size(&snapshot),
            start_time: start_time(&snapshot),
            end_time: None,
            estimated_end_time: None,
            danger: DangerType::Safe,
            bytes_received: snapshot.current_bytes,
            exists: snapshot.target_exists,
            incognito: snapshot.is_private,
            url: snapshot.source_url,
            referrer: snapshot.referrer,
            localname: snapshot.target_path,
            mime: snapshot.content_type,
            by_extension_id: owner.map(|o| o.id.clone()),
            by_extension_name: owner.map(|o| o.name.clone()),
        }
    }
}

fn can_resume(snapshot: &SessionSnapshot) -> bool {
    snapshot.stopped && snapshot.has_partial_data
}

/// Byte counts past `i64::MAX` saturate instead of wrapping negative
fn byte_count(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

fn total_bytes(snapshot: &SessionSnapshot) -> i64 {
    if snapshot.has_progress {
        byte_count(snapshot.total_bytes)
    } else {
        -1
    }
}

fn file_size(snapshot: &SessionSnapshot) -> i64 {
    if snapshot.succeeded {
        byte_count(snapshot.target_size)
    } else {
        -1
    }
}

fn start_time(snapshot: &SessionSnapshot) -> Option<String> {
    snapshot
        .start_time
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Live view of a registered download
#[derive(Clone)]
pub struct DownloadItem {
    id: DownloadId,
    registry: Registry,
}

impl DownloadItem {
    pub(crate) fn new(id: DownloadId, registry: Registry) -> Self {
        Self { id, registry }
    }

    fn entry(&self) -> Result<RegistryEntry> {
        self.registry.resolve(self.id)
    }

    fn snapshot(&self) -> Result<SessionSnapshot> {
        Ok(self.entry()?.session.snapshot())
    }

    pub fn id(&self) -> DownloadId {
        self.id
    }

    pub fn url(&self) -> Result<String> {
        Ok(self.snapshot()?.source_url)
    }

    pub fn referrer(&self) -> Result<Option<String>> {
        Ok(self.snapshot()?.referrer)
    }

    pub fn localname(&self) -> Result<PathBuf> {
        Ok(self.snapshot()?.target_path)
    }

    pub fn incognito(&self) -> Result<bool> {
        Ok(self.snapshot()?.is_private)
    }

    pub fn danger(&self) -> DangerType {
        DangerType::Safe
    }

    pub fn mime(&self) -> Result<Option<String>> {
        Ok(self.snapshot()?.content_type)
    }

    /// ISO-8601 with millisecond precision
    pub fn start_time(&self) -> Result<Option<String>> {
        Ok(start_time(&self.snapshot()?))
    }

    pub fn end_time(&self) -> Option<String> {
        None
    }

    pub fn estimated_end_time(&self) -> Option<String> {
        None
    }

    pub fn state(&self) -> Result<DownloadState> {
        let snapshot = self.snapshot()?;
        Ok(DownloadState::from_flags(snapshot.succeeded, snapshot.stopped))
    }

    pub fn can_resume(&self) -> Result<bool> {
        Ok(can_resume(&self.snapshot()?))
    }

    pub fn error(&self) -> Result<Option<InterruptReason>> {
        Ok(InterruptReason::classify(&self.snapshot()?))
    }

    pub fn bytes_received(&self) -> Result<u64> {
        Ok(self.snapshot()?.current_bytes)
    }

    /// `-1` until the engine knows the content length
    pub fn total_bytes(&self) -> Result<i64> {
        Ok(total_bytes(&self.snapshot()?))
    }

    /// `-1` until the download has succeeded
    pub fn file_size(&self) -> Result<i64> {
        Ok(file_size(&self.snapshot()?))
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.snapshot()?.target_exists)
    }

    pub fn by_extension_id(&self) -> Result<Option<String>> {
        Ok(self.entry()?.owner.map(|o| o.id))
    }

    pub fn by_extension_name(&self) -> Result<Option<String>> {
        Ok(self.entry()?.owner.map(|o| o.name))
    }

    /// All attributes, read from a single snapshot
    pub fn info(&self) -> Result<DownloadInfo> {
        let entry = self.entry()?;
        Ok(DownloadInfo::project(
            self.id,
            entry.session.snapshot(),
            entry.owner.as_ref(),
        ))
    }
}

impl std::fmt::Debug for DownloadItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadItem").field("id", &self.id).finish()
    }
}
