//! Downloads API error types

use thiserror::Error;
use webext_engine::EngineError;

use crate::registry::DownloadId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("Bad downloadId '{0}'")]
    UnknownDownloadId(DownloadId),

    #[error("The download '{0}' isn't complete yet")]
    DownloadNotComplete(DownloadId),

    #[error("downloads.{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("Missing permission: {0}")]
    PermissionDenied(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
