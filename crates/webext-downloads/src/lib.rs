//! Extension downloads API
//!
//! Exposes the browser's download engine to extensions:
//! - Integer download ids handed out by a per-service [`Registry`]
//! - Live [`DownloadItem`] views computed from engine snapshots
//! - Async commands with a shared last-error slot
//! - `onCreated` notifications for downloads started after subscribing

mod api;
mod callback;
mod config;
mod error;
mod events;
mod extension;
mod item;
mod last_error;
mod options;
mod registry;
mod service;

pub use api::ExtensionDownloads;
pub use callback::CallbackDownloads;
pub use config::DownloadsConfig;
pub use error::DownloadError;
pub use events::{CreatedListener, CREATED_BUFFER};
pub use extension::{ExtensionInfo, OPEN_PERMISSION};
pub use item::{DangerType, DownloadInfo, DownloadItem, DownloadState, InterruptReason};
pub use last_error::LastError;
pub use options::{ConflictAction, DownloadOptions, DownloadQuery, FileIconOptions};
pub use registry::{DownloadId, Registry, RegistryEntry};
pub use service::DownloadService;

pub use webext_engine as engine;

pub type Result<T> = std::result::Result<T, DownloadError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
