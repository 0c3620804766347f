//! Typed facade over a [`SessionStore`].
//!
//! Every key carries the record type stored under it, so components declare
//! what they read and write instead of passing raw strings around.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::traits::SessionStore;

/// A session key bound to the record type stored under it.
pub struct SessionKey<T> {
    name: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> SessionKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _record: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for SessionKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SessionKey<T> {}

impl<T> fmt::Debug for SessionKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.name)
    }
}

/// Shared handle to the session store with typed access.
#[derive(Clone)]
pub struct Session {
    backend: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(backend: Arc<dyn SessionStore>) -> Self {
        Self { backend }
    }

    /// Load the record under `key`.
    ///
    /// Absent or malformed values resolve to `T::default()`; the failure is
    /// logged and never surfaced.
    pub fn load<T>(&self, key: SessionKey<T>) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.try_load(key).unwrap_or_default()
    }

    /// Load the record under `key`, or `None` when absent or malformed.
    pub fn try_load<T>(&self, key: SessionKey<T>) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = self.backend.get(key.name())?;
        match serde_json::from_str(&raw) {
            // A stored JSON `null` counts as absent.
            Ok(Some(value)) => Some(value),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = key.name(), "Ignoring malformed session value: {}", e);
                None
            }
        }
    }

    /// Persist `value` under `key`. Write failures are logged, not returned.
    pub fn save<T>(&self, key: SessionKey<T>, value: &T)
    where
        T: Serialize,
    {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(key = key.name(), "Failed to serialize session value: {}", e);
                return;
            }
        };
        if let Err(e) = self.backend.set(key.name(), text) {
            tracing::warn!(key = key.name(), "Failed to persist session value: {}", e);
        }
    }

    /// Whether anything is stored under `key`.
    pub fn contains<T>(&self, key: SessionKey<T>) -> bool {
        self.backend.get(key.name()).is_some()
    }

    pub fn clear<T>(&self, key: SessionKey<T>) {
        self.backend.remove(key.name());
    }

    /// Remove a named set of keys in one pass.
    pub fn clear_all(&self, keys: &[&str]) {
        self.backend.clear_all(keys);
    }

    pub fn backend(&self) -> &Arc<dyn SessionStore> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::store::MemorySessionStore;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        hits: u32,
    }

    const COUNTER: SessionKey<Counter> = SessionKey::new("counter");

    fn session() -> (Arc<MemorySessionStore>, Session) {
        let backend = Arc::new(MemorySessionStore::new());
        let session = Session::new(backend.clone());
        (backend, session)
    }

    #[test]
    fn absent_key_loads_default() {
        let (_, session) = session();
        assert_eq!(session.load(COUNTER), Counter::default());
        assert!(!session.contains(COUNTER));
    }

    #[test]
    fn save_then_load() {
        let (_, session) = session();
        session.save(COUNTER, &Counter { hits: 3 });
        assert_eq!(session.load(COUNTER), Counter { hits: 3 });
        assert!(session.contains(COUNTER));
    }

    #[test]
    fn malformed_value_loads_default() {
        let (backend, session) = session();
        backend.set("counter", "{not json".to_string()).unwrap();
        assert_eq!(session.load(COUNTER), Counter::default());

        backend.set("counter", "null".to_string()).unwrap();
        assert!(session.try_load(COUNTER).is_none());
    }

    #[test]
    fn clear_removes_key() {
        let (_, session) = session();
        session.save(COUNTER, &Counter { hits: 1 });
        session.clear(COUNTER);
        assert!(!session.contains(COUNTER));
    }
}
