use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Could not resolve a location for the credential store")]
    NoLocation,
}
