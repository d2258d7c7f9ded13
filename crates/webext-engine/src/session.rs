//! Engine-side download session

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::EngineError;
use crate::Result;

/// Identity of a session inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of everything the engine knows about a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub source_url: String,
    pub referrer: Option<String>,
    pub target_path: PathBuf,
    pub is_private: bool,
    pub content_type: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub current_bytes: u64,
    pub total_bytes: u64,
    /// Whether `total_bytes` is meaningful (a content length was announced)
    pub has_progress: bool,
    /// Size of the target file on disk
    pub target_size: u64,
    pub target_exists: bool,
    pub succeeded: bool,
    pub stopped: bool,
    pub has_partial_data: bool,
    pub error: Option<EngineError>,
}

/// A single transfer owned by the engine.
///
/// All mutating calls are asynchronous and may complete after the session
/// state has already changed; readers always go through [`snapshot`].
///
/// [`snapshot`]: EngineSession::snapshot
#[async_trait]
pub trait EngineSession: Send + Sync {
    fn id(&self) -> SessionId;

    fn snapshot(&self) -> SessionSnapshot;

    /// Keep already received bytes when the transfer is stopped
    fn set_retain_partial_data(&self, retain: bool);

    /// Start or restart the transfer, resuming from partial data if any.
    /// Resolves once the transfer is running, not when it finishes.
    async fn start(&self) -> Result<()>;

    /// Stop the transfer. Partial data survives if retention is on.
    async fn cancel(&self) -> Result<()>;

    /// Stop the transfer for good
    async fn finalize(&self, remove_partial_data: bool) -> Result<()>;

    /// Open the finished file with the system handler
    async fn launch(&self) -> Result<()>;

    async fn show_containing_directory(&self) -> Result<()>;
}
