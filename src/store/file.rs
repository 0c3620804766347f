//! File-backed session store.
//!
//! Each session is a single JSON document named after its session id. A host
//! that restarts against the same id (a "navigation") resumes where it left
//! off; starting a new id is the equivalent of opening a new tab.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::traits::SessionStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionDocument {
    session_id: Uuid,
    updated_at: DateTime<Utc>,
    entries: BTreeMap<String, String>,
}

impl SessionDocument {
    fn empty(session_id: Uuid) -> Self {
        Self {
            session_id,
            updated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

/// Session store persisted as `<dir>/<session_id>.json`.
pub struct FileSessionStore {
    path: PathBuf,
    session_id: Uuid,
    doc: Mutex<SessionDocument>,
}

impl FileSessionStore {
    /// Start a fresh session under `dir`.
    pub fn create(dir: &Path) -> Result<Self, StoreError> {
        Self::open(dir, Uuid::new_v4())
    }

    /// Open (or create) the session `session_id` under `dir`.
    ///
    /// An unreadable or malformed document is discarded and the session
    /// starts empty.
    pub fn open(dir: &Path, session_id: Uuid) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{session_id}.json"));

        let doc = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<SessionDocument>(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Discarding malformed session document: {}", e);
                    SessionDocument::empty(session_id)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionDocument::empty(session_id),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(%session_id, entries = doc.entries.len(), "Opened session store");

        Ok(Self {
            path,
            session_id,
            doc: Mutex::new(doc),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the session holds no entries.
    pub fn is_empty(&self) -> bool {
        self.doc.lock().map(|doc| doc.entries.is_empty()).unwrap_or(true)
    }

    /// Delete the session document, ending the session. A later write
    /// starts a new document under the same id.
    pub fn end(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&self, doc: &SessionDocument) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let doc = self.doc.lock().ok()?;
        doc.entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().map_err(|e| StoreError::WriteFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        doc.entries.insert(key.to_string(), value);
        doc.updated_at = Utc::now();
        self.flush(&doc)
    }

    fn remove(&self, key: &str) {
        let Ok(mut doc) = self.doc.lock() else {
            return;
        };
        if doc.entries.remove(key).is_none() {
            return;
        }
        doc.updated_at = Utc::now();
        if let Err(e) = self.flush(&doc) {
            tracing::warn!(key, "Failed to persist session key removal: {}", e);
        }
    }
}
