use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{KeyValueStore, StoreError};

/// Credential file name in the cache directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Durable store kept as a JSON object on disk.
///
/// Every operation reads the file, so two processes sharing a cache
/// directory see each other's writes (last writer wins).
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(CREDENTIALS_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|map| {
            map.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed credential file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("accessToken", "abc").unwrap();
        store.set("userCode", "U-17").unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("userCode").unwrap().as_deref(), Some("U-17"));
        assert_eq!(reopened.get("roleId").unwrap(), None);
    }

    #[test]
    fn test_clear_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        store.clear().unwrap();
        store.remove("accessToken").unwrap();
        assert_eq!(store.get("accessToken").unwrap(), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("accessToken", "abc").unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get("accessToken").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.get("accessToken"), Err(StoreError::Corrupt(_))));
        // Clearing still works so invalidation can recover
        store.clear().unwrap();
    }
}
