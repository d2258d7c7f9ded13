//! In-process engine
//!
//! Sessions never touch the network. Tests and embedders drive them through
//! the reporting methods on [`MemorySession`], the same way a native engine
//! would push progress from its transfer threads.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crate::engine::{DownloadEngine, SessionRequest, SessionView, ViewId};
use crate::error::EngineError;
use crate::session::{EngineSession, SessionId, SessionSnapshot};
use crate::Result;

struct EngineInner {
    preferred_dir: RwLock<Option<PathBuf>>,
    /// Every session ever created, started or not
    created: RwLock<HashMap<SessionId, Arc<MemorySession>>>,
    /// Sessions visible to views, in the order they became visible
    listed: RwLock<Vec<Arc<MemorySession>>>,
    views: RwLock<HashMap<ViewId, Arc<dyn SessionView>>>,
    next_view_id: AtomicU64,
    create_failure: Mutex<Option<EngineError>>,
    /// Handed to the next created session as its first start failure
    start_failure: Mutex<Option<EngineError>>,
    shown_directories: Mutex<Vec<PathBuf>>,
}

impl EngineInner {
    fn list(&self, session: Arc<MemorySession>) {
        let views: Vec<Arc<dyn SessionView>> = {
            let mut listed = self.listed.write();
            listed.push(Arc::clone(&session));
            self.views.read().values().cloned().collect()
        };

        tracing::debug!(session_id = %session.id, views = views.len(), "Session listed");

        for view in views {
            view.on_session_added(session.clone());
        }
    }
}

#[derive(Clone)]
pub struct MemoryEngine {
    inner: Arc<EngineInner>,
}

impl MemoryEngine {
    pub fn new(preferred_dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                preferred_dir: RwLock::new(Some(preferred_dir)),
                created: RwLock::new(HashMap::new()),
                listed: RwLock::new(Vec::new()),
                views: RwLock::new(HashMap::new()),
                next_view_id: AtomicU64::new(1),
                create_failure: Mutex::new(None),
                start_failure: Mutex::new(None),
                shown_directories: Mutex::new(Vec::new()),
            }),
        }
    }

    /// `None` makes `preferred_directory` fail
    pub fn set_preferred_directory(&self, dir: Option<PathBuf>) {
        *self.inner.preferred_dir.write() = dir;
    }

    /// Make the next `create_session` call fail with `error`
    pub fn fail_next_create(&self, error: EngineError) {
        *self.inner.create_failure.lock() = Some(error);
    }

    /// Make the first `start` of the next created session fail with `error`
    pub fn fail_next_start(&self, error: EngineError) {
        *self.inner.start_failure.lock() = Some(error);
    }

    /// Simulate a download the browser started on its own (not through an
    /// extension). It is listed immediately.
    pub fn add_external_session(&self, source: &str, target: PathBuf) -> Arc<MemorySession> {
        let session = self.build_session(SessionRequest {
            source: source.to_string(),
            target,
        });
        {
            let mut state = session.state.write();
            state.start_time = Some(Utc::now());
        }
        session.listed.store(true, Ordering::SeqCst);
        self.inner.list(Arc::clone(&session));
        session
    }

    pub fn session(&self, id: SessionId) -> Option<Arc<MemorySession>> {
        self.inner.created.read().get(&id).cloned()
    }

    pub fn listed_count(&self) -> usize {
        self.inner.listed.read().len()
    }

    pub fn view_count(&self) -> usize {
        self.inner.views.read().len()
    }

    pub fn shown_directories(&self) -> Vec<PathBuf> {
        self.inner.shown_directories.lock().clone()
    }

    fn build_session(&self, request: SessionRequest) -> Arc<MemorySession> {
        let id = SessionId::new();
        let session = Arc::new_cyclic(|this| MemorySession {
            id,
            this: this.clone(),
            engine: Arc::downgrade(&self.inner),
            state: RwLock::new(SessionSnapshot {
                source_url: request.source,
                target_path: request.target,
                ..SessionSnapshot::default()
            }),
            retain_partial_data: AtomicBool::new(false),
            listed: AtomicBool::new(false),
            start_failure: Mutex::new(None),
            launches: AtomicUsize::new(0),
            reveals: AtomicUsize::new(0),
        });
        self.inner.created.write().insert(id, Arc::clone(&session));
        session
    }
}

#[async_trait]
impl DownloadEngine for MemoryEngine {
    async fn preferred_directory(&self) -> Result<PathBuf> {
        self.inner
            .preferred_dir
            .read()
            .clone()
            .ok_or_else(|| EngineError::Other("No preferred downloads directory".to_string()))
    }

    async fn create_session(&self, request: SessionRequest) -> Result<Arc<dyn EngineSession>> {
        if let Some(error) = self.inner.create_failure.lock().take() {
            return Err(error);
        }
        let session = self.build_session(request);
        if let Some(error) = self.inner.start_failure.lock().take() {
            session.fail_next_start(error);
        }
        tracing::debug!(session_id = %session.id, "Created session");
        Ok(session as Arc<dyn EngineSession>)
    }

    async fn add_view(&self, view: Arc<dyn SessionView>) -> Result<ViewId> {
        let id = ViewId(self.inner.next_view_id.fetch_add(1, Ordering::SeqCst));

        // Insert under the list lock so a session is either replayed or
        // announced live, never both.
        let existing = {
            let listed = self.inner.listed.read();
            self.inner.views.write().insert(id, Arc::clone(&view));
            listed.clone()
        };

        for session in existing {
            view.on_session_added(session);
        }

        Ok(id)
    }

    fn remove_view(&self, id: ViewId) {
        self.inner.views.write().remove(&id);
    }

    async fn show_directory(&self, path: &Path) -> Result<()> {
        self.inner.shown_directories.lock().push(path.to_path_buf());
        Ok(())
    }
}

pub struct MemorySession {
    id: SessionId,
    this: Weak<MemorySession>,
    engine: Weak<EngineInner>,
    state: RwLock<SessionSnapshot>,
    retain_partial_data: AtomicBool,
    listed: AtomicBool,
    start_failure: Mutex<Option<EngineError>>,
    launches: AtomicUsize,
    reveals: AtomicUsize,
}

impl MemorySession {
    /// Bytes arrived. `total` is the announced content length, if any.
    pub fn report_progress(&self, current: u64, total: Option<u64>) {
        let mut state = self.state.write();
        state.current_bytes = current;
        if let Some(total) = total {
            state.total_bytes = total;
            state.has_progress = true;
        }
    }

    pub fn set_content_type(&self, content_type: &str) {
        self.state.write().content_type = Some(content_type.to_string());
    }

    pub fn set_referrer(&self, referrer: &str) {
        self.state.write().referrer = Some(referrer.to_string());
    }

    /// Transfer finished and the target holds `size` bytes
    pub fn succeed(&self, size: u64) {
        let mut state = self.state.write();
        state.succeeded = true;
        state.stopped = true;
        state.error = None;
        state.current_bytes = size;
        state.target_size = size;
        state.target_exists = true;
        state.has_partial_data = false;
    }

    /// Transfer stopped on an engine error
    pub fn fail(&self, error: EngineError) {
        let retain = self.retain_partial_data.load(Ordering::SeqCst);
        let mut state = self.state.write();
        state.stopped = true;
        state.has_partial_data = retain && state.current_bytes > 0;
        state.error = Some(error);
    }

    /// Make the next `start` call fail with `error`
    pub fn fail_next_start(&self, error: EngineError) {
        *self.start_failure.lock() = Some(error);
    }

    pub fn retains_partial_data(&self) -> bool {
        self.retain_partial_data.load(Ordering::SeqCst)
    }

    pub fn is_listed(&self) -> bool {
        self.listed.load(Ordering::SeqCst)
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn reveal_count(&self) -> usize {
        self.reveals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineSession for MemorySession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.state.read().clone()
    }

    fn set_retain_partial_data(&self, retain: bool) {
        self.retain_partial_data.store(retain, Ordering::SeqCst);
    }

    async fn start(&self) -> Result<()> {
        if let Some(error) = self.start_failure.lock().take() {
            self.fail(error.clone());
            return Err(error);
        }

        {
            let mut state = self.state.write();
            if state.succeeded {
                return Ok(());
            }
            state.stopped = false;
            state.error = None;
            state.has_partial_data = false;
            if state.start_time.is_none() {
                state.start_time = Some(Utc::now());
            }
        }

        if !self.listed.swap(true, Ordering::SeqCst) {
            if let (Some(engine), Some(this)) = (self.engine.upgrade(), self.this.upgrade()) {
                engine.list(this);
            }
        }

        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        let retain = self.retain_partial_data.load(Ordering::SeqCst);
        let mut state = self.state.write();
        if state.succeeded {
            return Ok(());
        }
        state.stopped = true;
        state.has_partial_data = retain && state.current_bytes > 0;
        if !state.has_partial_data {
            state.current_bytes = 0;
        }
        Ok(())
    }

    async fn finalize(&self, remove_partial_data: bool) -> Result<()> {
        let mut state = self.state.write();
        if !state.succeeded {
            state.stopped = true;
        }
        if remove_partial_data {
            state.has_partial_data = false;
            if !state.succeeded {
                state.current_bytes = 0;
            }
        }
        Ok(())
    }

    async fn launch(&self) -> Result<()> {
        if !self.state.read().succeeded {
            return Err(EngineError::Other("Nothing to launch yet".to_string()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn show_containing_directory(&self) -> Result<()> {
        self.reveals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Mutex<Vec<SessionId>>);

    impl SessionView for Recorder {
        fn on_session_added(&self, session: Arc<dyn EngineSession>) {
            self.0.lock().push(session.id());
        }
    }

    fn request(name: &str) -> SessionRequest {
        SessionRequest {
            source: format!("https://example.com/{name}"),
            target: PathBuf::from("/downloads").join(name),
        }
    }

    #[tokio::test]
    async fn test_session_listed_on_first_start() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        let session = engine.create_session(request("a.bin")).await.unwrap();
        assert_eq!(engine.listed_count(), 0);

        session.start().await.unwrap();
        session.start().await.unwrap();
        assert_eq!(engine.listed_count(), 1);
        assert!(session.snapshot().start_time.is_some());
    }

    #[tokio::test]
    async fn test_add_view_replays_existing_sessions() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        let existing = engine.add_external_session("https://example.com/old", "/downloads/old".into());

        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let view_id = engine.add_view(recorder.clone()).await.unwrap();
        assert_eq!(*recorder.0.lock(), vec![existing.id()]);

        let fresh = engine.create_session(request("new")).await.unwrap();
        fresh.start().await.unwrap();
        assert_eq!(recorder.0.lock().len(), 2);

        engine.remove_view(view_id);
        assert_eq!(engine.view_count(), 0);
        engine.add_external_session("https://example.com/late", "/downloads/late".into());
        assert_eq!(recorder.0.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_data_only_when_retained() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));

        let kept = engine.create_session(request("kept")).await.unwrap();
        kept.set_retain_partial_data(true);
        kept.start().await.unwrap();
        engine.session(kept.id()).unwrap().report_progress(512, Some(1024));
        kept.cancel().await.unwrap();
        let snapshot = kept.snapshot();
        assert!(snapshot.stopped);
        assert!(snapshot.has_partial_data);
        assert_eq!(snapshot.current_bytes, 512);

        let dropped = engine.create_session(request("dropped")).await.unwrap();
        dropped.start().await.unwrap();
        engine.session(dropped.id()).unwrap().report_progress(512, None);
        dropped.cancel().await.unwrap();
        assert!(!dropped.snapshot().has_partial_data);
        assert_eq!(dropped.snapshot().current_bytes, 0);
    }

    #[tokio::test]
    async fn test_finalize_discards_partial_data() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        let session = engine.create_session(request("f")).await.unwrap();
        session.set_retain_partial_data(true);
        session.start().await.unwrap();
        engine.session(session.id()).unwrap().report_progress(10, None);

        session.finalize(true).await.unwrap();
        let snapshot = session.snapshot();
        assert!(snapshot.stopped);
        assert!(!snapshot.has_partial_data);
        assert_eq!(snapshot.current_bytes, 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_one_shot() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        engine.fail_next_create(EngineError::TargetFailed("read-only".into()));

        assert!(engine.create_session(request("x")).await.is_err());
        assert!(engine.create_session(request("x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_failure_applies_to_next_session() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        engine.fail_next_start(EngineError::SourceFailed("refused".into()));

        let failing = engine.create_session(request("a")).await.unwrap();
        let working = engine.create_session(request("b")).await.unwrap();

        assert_eq!(
            failing.start().await,
            Err(EngineError::SourceFailed("refused".into()))
        );
        assert!(working.start().await.is_ok());
        assert_eq!(engine.listed_count(), 1);
    }

    #[tokio::test]
    async fn test_launch_requires_success() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        let session = engine.create_session(request("l")).await.unwrap();
        assert!(session.launch().await.is_err());

        let memory = engine.session(session.id()).unwrap();
        memory.succeed(2048);
        session.launch().await.unwrap();
        assert_eq!(memory.launch_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_file_tolerates_missing() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.bin");
        std::fs::write(&path, b"payload").unwrap();

        engine.remove_file(&path).await.unwrap();
        assert!(!path.exists());
        engine.remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_preferred_directory() {
        let engine = MemoryEngine::new(PathBuf::from("/downloads"));
        engine.set_preferred_directory(None);
        assert!(engine.preferred_directory().await.is_err());
    }
}
