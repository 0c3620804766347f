//! `SessionStore` trait: the key-value interface every funnel component
//! persists through.

use crate::error::StoreError;

/// Backend-agnostic session-scoped key-value store.
///
/// Values are raw JSON strings. The store lives for one browsing session:
/// navigation never clears it, ending the session does. There is a single
/// writer at a time, so implementations only need to be internally
/// consistent, not transactional.
pub trait SessionStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str);

    /// Remove every key in `keys`.
    fn clear_all(&self, keys: &[&str]) {
        for key in keys {
            self.remove(key);
        }
    }
}
