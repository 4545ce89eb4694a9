//! Where the provider session survives page reloads.
//!
//! The client writes the serialized session through a [`SessionStorage`]
//! whenever it changes and reads it back when it is created. Browser builds
//! use `localStorage`; everything else keeps it in memory.

use std::sync::{Arc, Mutex};
use tracing::warn;

/// Storage key the session is saved under.
pub const SESSION_STORAGE_KEY: &str = "studentcollab.auth";

/// A single string slot for the serialized provider session.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, value: &str);
    fn clear(&self);
}

/// Keeps the session in process memory.
///
/// Clones share the slot, so two clients built on clones see each other's
/// writes the way two tabs share `localStorage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.slot().clone()
    }

    fn save(&self, value: &str) {
        *self.slot() = Some(value.to_string());
    }

    fn clear(&self) {
        *self.slot() = None;
    }
}

/// The browser's `localStorage`, looked up on every access.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct BrowserStorage {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStorage for BrowserStorage {
    fn load(&self) -> Option<String> {
        Self::storage()?.get_item(&self.key).ok().flatten()
    }

    fn save(&self, value: &str) {
        let saved = Self::storage().map(|s| s.set_item(&self.key, value).is_ok());
        if saved != Some(true) {
            warn!(key = %self.key, "could not persist session");
        }
    }

    fn clear(&self) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(&self.key);
        }
    }
}

/// The storage a client uses when none is given.
pub(crate) fn default_storage() -> Arc<dyn SessionStorage> {
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(BrowserStorage::new(SESSION_STORAGE_KEY))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(MemoryStorage::default())
    }
}

/// Decodes a stored value, clearing the slot when it cannot be read.
pub(crate) fn restore<T: serde::de::DeserializeOwned>(storage: &dyn SessionStorage) -> Option<T> {
    let raw = storage.load()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "discarding unreadable stored session");
            storage.clear();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_the_slot() {
        let a = MemoryStorage::default();
        let b = a.clone();
        a.save("token");
        assert_eq!(b.load().as_deref(), Some("token"));
        b.clear();
        assert!(a.load().is_none());
    }

    #[test]
    fn unreadable_value_is_cleared() {
        let storage = MemoryStorage::default();
        storage.save("{not json");
        assert!(restore::<serde_json::Value>(&storage).is_none());
        assert!(storage.load().is_none());
    }
}
