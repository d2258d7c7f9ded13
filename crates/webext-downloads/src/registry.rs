//! Download handle registry
//!
//! Maps the integer ids extensions see to engine sessions. Ids start at 1,
//! only ever grow, and are never handed out twice within a registry.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use webext_engine::{EngineSession, SessionId};

use crate::error::DownloadError;
use crate::extension::ExtensionInfo;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(pub u64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
pub struct RegistryEntry {
    pub id: DownloadId,
    pub session: Arc<dyn EngineSession>,
    /// Extension that started the download; `None` for downloads the
    /// browser started itself
    pub owner: Option<ExtensionInfo>,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id)
            .field("session", &self.session.id())
            .field("owner", &self.owner.as_ref().map(|o| &o.id))
            .finish()
    }
}

#[derive(Default)]
struct RegistryState {
    last_id: u64,
    entries: HashMap<DownloadId, RegistryEntry>,
    by_session: HashMap<SessionId, DownloadId>,
    /// Sessions whose entry was removed; the engine may still list them
    removed: HashSet<SessionId>,
}

impl RegistryState {
    fn insert(
        &mut self,
        session: Arc<dyn EngineSession>,
        owner: Option<ExtensionInfo>,
    ) -> DownloadId {
        self.last_id += 1;
        let id = DownloadId(self.last_id);
        self.by_session.insert(session.id(), id);
        self.entries.insert(id, RegistryEntry { id, session, owner });
        id
    }
}

#[derive(Clone, Default)]
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session started by `owner`.
    ///
    /// A session that is already registered keeps its id and owner.
    pub fn create(
        &self,
        session: Arc<dyn EngineSession>,
        owner: Option<ExtensionInfo>,
    ) -> DownloadId {
        let mut state = self.state.write();
        if let Some(id) = state.by_session.get(&session.id()) {
            return *id;
        }
        state.insert(session, owner)
    }

    /// Id for a session the engine reported, registering it without an
    /// owner if this layer has not seen it before. Sessions whose entry was
    /// removed stay removed.
    pub fn adopt(&self, session: Arc<dyn EngineSession>) -> Option<DownloadId> {
        let mut state = self.state.write();
        let session_id = session.id();
        if let Some(id) = state.by_session.get(&session_id) {
            return Some(*id);
        }
        if state.removed.contains(&session_id) {
            return None;
        }
        Some(state.insert(session, None))
    }

    pub fn resolve(&self, id: DownloadId) -> Result<RegistryEntry> {
        self.state
            .read()
            .entries
            .get(&id)
            .cloned()
            .ok_or(DownloadError::UnknownDownloadId(id))
    }

    pub fn remove(&self, id: DownloadId) -> Result<RegistryEntry> {
        let mut state = self.state.write();
        let entry = state
            .entries
            .remove(&id)
            .ok_or(DownloadError::UnknownDownloadId(id))?;
        let session_id = entry.session.id();
        state.by_session.remove(&session_id);
        state.removed.insert(session_id);
        Ok(entry)
    }

    pub fn find_by_session(&self, session: SessionId) -> Option<DownloadId> {
        self.state.read().by_session.get(&session).copied()
    }

    pub fn contains(&self, id: DownloadId) -> bool {
        self.state.read().entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<DownloadId> {
        let mut ids: Vec<DownloadId> = self.state.read().entries.keys().copied().collect();
        ids.sort();
        ids
    }
}
