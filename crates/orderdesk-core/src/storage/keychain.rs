use std::collections::BTreeMap;

use keyring::Entry;

use super::{KeyValueStore, StoreError};

const SERVICE_NAME: &str = "orderdesk";

/// Durable store kept in the OS keychain.
///
/// All keys for a profile live in a single keychain entry as a JSON object,
/// so clearing is one delete.
pub struct KeyringStore {
    profile: String,
}

impl KeyringStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Ok(Entry::new(SERVICE_NAME, &self.profile)?)
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(secret) => Ok(serde_json::from_str(&secret)?),
            Err(keyring::Error::NoEntry) => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if map.is_empty() {
            return self.clear();
        }
        let secret = serde_json::to_string(map)?;
        self.entry()?.set_password(&secret)?;
        Ok(())
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
