use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::{
    KeyValueStore, MemoryStore, StoreError, ACCESS_TOKEN_KEY, DESIGNATION_KEY, ROLE_ID_KEY,
    USER_CODE_KEY,
};

/// What a successful login leaves behind: the token plus the user attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub access_token: String,
    #[serde(default, deserialize_with = "opaque_string")]
    pub role_id: Option<String>,
    #[serde(default, deserialize_with = "opaque_string")]
    pub user_code: Option<String>,
    #[serde(default, deserialize_with = "opaque_string")]
    pub designation: Option<String>,
}

/// Attributes are opaque strings; the backend sometimes sends ids as numbers.
fn opaque_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl LoginRecord {
    fn attributes(&self) -> [(&'static str, Option<&str>); 3] {
        [
            (ROLE_ID_KEY, self.role_id.as_deref()),
            (USER_CODE_KEY, self.user_code.as_deref()),
            (DESIGNATION_KEY, self.designation.as_deref()),
        ]
    }
}

/// The durable and session-scoped stores, always cleared together.
///
/// Clone is cheap; both stores are shared.
#[derive(Clone)]
pub struct CredentialStore {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Both stores in memory. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Durable backend paired with a fresh session-scoped store.
    pub fn with_durable(durable: Arc<dyn KeyValueStore>) -> Self {
        Self::new(durable, Arc::new(MemoryStore::new()))
    }

    pub fn durable(&self) -> &dyn KeyValueStore {
        self.durable.as_ref()
    }

    pub fn session(&self) -> &dyn KeyValueStore {
        self.session.as_ref()
    }

    /// Read the bearer token, preferring the session-scoped copy.
    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.attribute(ACCESS_TOKEN_KEY)
    }

    pub fn attribute(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(value) = self.session.get(key)? {
            return Ok(Some(value));
        }
        self.durable.get(key)
    }

    /// Persist a login. Attributes absent from the record are removed so no
    /// value from a previous user survives.
    pub fn establish(&self, record: &LoginRecord) -> Result<(), StoreError> {
        for store in [&self.durable, &self.session] {
            store.set(ACCESS_TOKEN_KEY, &record.access_token)?;
            for (key, value) in record.attributes() {
                match value {
                    Some(v) => store.set(key, v)?,
                    None => store.remove(key)?,
                }
            }
        }
        debug!(has_role = record.role_id.is_some(), "Login stored");
        Ok(())
    }

    /// Clear both stores. A failure in one store does not stop the other
    /// from being cleared; the first error is returned.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let durable = self.durable.clear();
        let session = self.session.clear();
        if let Err(ref e) = durable {
            warn!(error = %e, "Failed to clear durable credential store");
        }
        if let Err(ref e) = session {
            warn!(error = %e, "Failed to clear session credential store");
        }
        durable.and(session)
    }
}
