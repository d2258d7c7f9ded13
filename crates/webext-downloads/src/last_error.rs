//! Shared last-error slot
//!
//! Every failed command leaves its error here, independently of what the
//! caller gets back. Extensions read it the way they read `runtime.lastError`.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::DownloadError;

#[derive(Debug, Clone, Default)]
pub struct LastError {
    slot: Arc<Mutex<Option<DownloadError>>>,
}

impl LastError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, error: &DownloadError) {
        tracing::warn!(error = %error, "Downloads command failed");
        *self.slot.lock() = Some(error.clone());
    }

    pub fn get(&self) -> Option<DownloadError> {
        self.slot.lock().clone()
    }

    pub fn take(&self) -> Option<DownloadError> {
        self.slot.lock().take()
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}
