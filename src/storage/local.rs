//! Local file system store
//!
//! Each slot is one JSON file named after its key inside a base directory.

use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Store, StoreError};

/// A store that keeps each slot in `<base_dir>/<key>.json`
pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    /// Create a local store, creating the base directory if needed
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();

        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
        }

        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the file path for a slot key
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }
}

impl Store for LocalStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, text: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");

        // write the whole snapshot aside, then swap it in
        fs::write(&staging, text)?;
        if let Err(e) = fs::rename(&staging, &path) {
            fs::remove_file(&staging).ok();
            return Err(e.into());
        }

        debug!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_missing_slot() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();
        assert!(store.read("content").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested/data")).unwrap();

        store.write("site.content", "{\"a\":1}").unwrap();
        store.write("site.content", "{\"a\":2}").unwrap();

        assert_eq!(store.read("site.content").unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(store.base_dir().join("site.content.json").exists());
        assert!(!store.base_dir().join("site.content.json.tmp").exists());
    }

    #[test]
    fn test_rejects_unsafe_keys() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.write(key, "{}"),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }
}
