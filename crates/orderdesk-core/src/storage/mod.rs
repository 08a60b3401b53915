//! Credential Store: synchronous, string-valued key/value persistence.
//!
//! This module provides:
//! - `KeyValueStore`: the storage seam every backend implements
//! - `MemoryStore`: session-scoped store (lives as long as the process)
//! - `FileStore`: durable store kept as a JSON map in the cache directory
//! - `KeyringStore`: durable store kept in the OS keychain
//! - `CredentialStore`: the durable/session pair the core reads and clears

pub mod credentials;
pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;

#[cfg(test)]
pub(crate) mod testing;

pub use credentials::{CredentialStore, LoginRecord};
pub use error::StoreError;
pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// Key holding the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Auxiliary user attribute keys, written at login and cleared with the token.
pub const ROLE_ID_KEY: &str = "roleId";
pub const USER_CODE_KEY: &str = "userCode";
pub const DESIGNATION_KEY: &str = "designation";

/// Every key the core writes. Clearing removes at least these.
pub const SESSION_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, ROLE_ID_KEY, USER_CODE_KEY, DESIGNATION_KEY];

/// Synchronous string key/value storage.
///
/// Last writer wins; no transactions. `remove` and `clear` on absent data
/// succeed.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}
