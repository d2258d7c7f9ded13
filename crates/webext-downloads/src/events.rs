//! `onCreated` notifications
//!
//! Each listener attaches its own view to the engine. The engine replays
//! its current sessions while the view is being attached; those are
//! registered but not delivered. Each listener buffers at most
//! `CREATED_BUFFER` undelivered ids; further additions are dropped with a
//! warning until the listener catches up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

use webext_engine::{DownloadEngine, EngineSession, SessionView, ViewId};

use crate::item::DownloadItem;
use crate::registry::{DownloadId, Registry};
use crate::Result;

/// Undelivered ids a listener holds before it starts dropping additions
pub const CREATED_BUFFER: usize = 256;

struct CreatedView {
    registry: Registry,
    armed: AtomicBool,
    tx: mpsc::Sender<DownloadId>,
}

impl SessionView for CreatedView {
    fn on_session_added(&self, session: Arc<dyn EngineSession>) {
        let session_id = session.id();
        let Some(id) = self.registry.adopt(session) else {
            tracing::debug!(session_id = %session_id, "Skipping removed download");
            return;
        };
        if !self.armed.load(Ordering::SeqCst) {
            tracing::debug!(download_id = %id, "Skipping pre-existing download");
            return;
        }
        match self.tx.try_send(id) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(download_id = %id, "onCreated listener is full, dropping download");
            }
        }
    }
}

/// Stream of downloads created after subscribing. Dropping it unsubscribes.
pub struct CreatedListener {
    rx: mpsc::Receiver<DownloadId>,
    registry: Registry,
    engine: Arc<dyn DownloadEngine>,
    view_id: ViewId,
}

impl CreatedListener {
    pub(crate) async fn subscribe(
        engine: Arc<dyn DownloadEngine>,
        registry: Registry,
    ) -> Result<Self> {
        Self::subscribe_with_capacity(engine, registry, CREATED_BUFFER).await
    }

    pub(crate) async fn subscribe_with_capacity(
        engine: Arc<dyn DownloadEngine>,
        registry: Registry,
        capacity: usize,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel(capacity);
        let view = Arc::new(CreatedView {
            registry: registry.clone(),
            armed: AtomicBool::new(false),
            tx,
        });

        let view_id = engine.add_view(view.clone()).await?;
        view.armed.store(true, Ordering::SeqCst);

        tracing::debug!(view_id = view_id.0, "Subscribed to download additions");

        Ok(Self {
            rx,
            registry,
            engine,
            view_id,
        })
    }

    /// Next created download. `None` once the engine is gone.
    pub async fn recv(&mut self) -> Option<DownloadItem> {
        let id = self.rx.recv().await?;
        Some(DownloadItem::new(id, self.registry.clone()))
    }

    pub fn try_recv(&mut self) -> Option<DownloadItem> {
        let id = self.rx.try_recv().ok()?;
        Some(DownloadItem::new(id, self.registry.clone()))
    }

    pub fn unsubscribe(self) {}
}

impl Drop for CreatedListener {
    fn drop(&mut self) {
        self.engine.remove_view(self.view_id);
        tracing::debug!(view_id = self.view_id.0, "Unsubscribed from download additions");
    }
}
