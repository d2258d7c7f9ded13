//! Download engine contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::session::EngineSession;
use crate::Result;

/// Parameters for a new engine session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub source: String,
    pub target: PathBuf,
}

/// Handle for an attached [`SessionView`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// Observer of the engine's session list
pub trait SessionView: Send + Sync {
    fn on_session_added(&self, session: Arc<dyn EngineSession>);
}

/// Everything the downloads API needs from the host's download subsystem.
///
/// Sessions created through [`create_session`] are not visible to views
/// until they are first started.
///
/// [`create_session`]: DownloadEngine::create_session
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Directory the user picked for downloads
    async fn preferred_directory(&self) -> Result<PathBuf>;

    async fn create_session(&self, request: SessionRequest) -> Result<Arc<dyn EngineSession>>;

    /// Attach a view. Every session already in the list is reported to the
    /// view before this resolves.
    async fn add_view(&self, view: Arc<dyn SessionView>) -> Result<ViewId>;

    fn remove_view(&self, id: ViewId);

    async fn show_directory(&self, path: &Path) -> Result<()>;

    /// Delete a file. A file that is already gone counts as removed.
    async fn remove_file(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "File already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
