//! In-process store with an optional size quota
//!
//! Behaves like a browser's local storage: a small map of text slots that
//! refuses writes once the configured byte budget would be exceeded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{Store, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
    quota: Mutex<Option<usize>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of all slots to `bytes`
    pub fn with_quota(self, bytes: usize) -> Self {
        self.set_quota(Some(bytes));
        self
    }

    /// Seed a slot without counting it as a write
    pub fn with_slot(self, key: &str, text: &str) -> Self {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), text.to_string());
        }
        self
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        if let Ok(mut quota) = self.quota.lock() {
            *quota = bytes;
        }
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current content of a slot
    pub fn slot(&self, key: &str) -> Option<String> {
        self.slots.lock().ok()?.get(key).cloned()
    }
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, text: &str) -> Result<(), StoreError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;

        let quota = self.quota.lock().ok().and_then(|q| *q);
        if let Some(quota) = quota {
            let others: usize = slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + text.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }

        slots.insert(key.to_string(), text.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_keeps_previous_content() {
        let store = MemoryStore::new().with_quota(16);

        store.write("k", "small").unwrap();
        let result = store.write("k", "a value that is far too large");

        assert!(matches!(result, Err(StoreError::QuotaExceeded { quota: 16, .. })));
        assert_eq!(store.read("k").unwrap().as_deref(), Some("small"));
        assert_eq!(store.write_count(), 1);

        store.set_quota(None);
        store.write("k", "a value that is far too large").unwrap();
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_seeded_slot_is_not_a_write() {
        let store = MemoryStore::new().with_slot("k", "{}");
        assert_eq!(store.slot("k").as_deref(), Some("{}"));
        assert_eq!(store.write_count(), 0);
    }
}
