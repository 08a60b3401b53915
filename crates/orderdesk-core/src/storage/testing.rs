use std::io;

use super::{KeyValueStore, MemoryStore, StoreError};

/// Reads and writes like a `MemoryStore`, but refuses to be cleared.
#[derive(Default)]
pub(crate) struct UnclearableStore {
    inner: MemoryStore,
}

impl KeyValueStore for UnclearableStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only").into())
    }
}
