//! Wiring for the shell: one credential store, one navigator, one session
//! cell, shared by the monitor and the gateway.

use std::sync::Arc;

use anyhow::{Context, Result};
use orderdesk_core::auth::HeadlessNavigator;
use orderdesk_core::config::CredentialBackend;
use orderdesk_core::storage::{FileStore, KeyringStore};
use orderdesk_core::{
    Config, CredentialStore, Gateway, Invalidator, KeyValueStore, SessionCell, SessionMonitor,
};
use tracing::debug;

/// Keychain entry holding the shell's credentials
const KEYRING_PROFILE: &str = "session";

pub struct App {
    pub config: Config,
    pub store: CredentialStore,
    pub navigator: Arc<HeadlessNavigator>,
    pub cell: Arc<SessionCell>,
    pub invalidator: Invalidator,
    pub gateway: Gateway,
}

impl App {
    /// Build the shell with the navigator starting at `start_path`.
    pub fn new(config: Config, start_path: &str) -> Result<Self> {
        let store = CredentialStore::with_durable(Self::durable_store(&config)?);
        Self::with_store(config, store, start_path)
    }

    /// For commands that exit right after their request: the process would
    /// end before a delayed redirect fires, so redirect immediately.
    pub fn one_shot(config: Config, start_path: &str) -> Result<Self> {
        Self::new(one_shot_config(config), start_path)
    }

    fn durable_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = match config.credential_backend {
            CredentialBackend::File => {
                let dir = config.cache_dir().context("Failed to resolve cache directory")?;
                debug!(dir = %dir.display(), "Using file credential store");
                Arc::new(FileStore::new(dir))
            }
            CredentialBackend::Keyring => {
                debug!("Using keychain credential store");
                Arc::new(KeyringStore::new(KEYRING_PROFILE))
            }
        };
        Ok(store)
    }

    pub fn with_store(config: Config, store: CredentialStore, start_path: &str) -> Result<Self> {
        let navigator = Arc::new(HeadlessNavigator::new(start_path));
        let cell = Arc::new(SessionCell::new());
        let invalidator = Invalidator::new(
            store.clone(),
            navigator.clone(),
            Arc::clone(&cell),
            config.login_path.clone(),
            config.redirect_grace(),
        );
        let gateway = Gateway::from_config(&config, store.clone(), invalidator.clone())
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            store,
            navigator,
            cell,
            invalidator,
            gateway,
        })
    }

    pub fn monitor(&self) -> Arc<SessionMonitor> {
        Arc::new(SessionMonitor::from_config(
            &self.config,
            self.store.clone(),
            self.navigator.clone(),
            self.invalidator.clone(),
        ))
    }
}

fn one_shot_config(mut config: Config) -> Config {
    config.redirect_grace_ms = 0;
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::{InvalidationOutcome, LoginRecord};

    #[test]
    fn test_one_shot_logout_navigates_before_returning() {
        let store = CredentialStore::in_memory();
        store
            .establish(&LoginRecord {
                access_token: "tok".to_string(),
                role_id: None,
                user_code: None,
                designation: None,
            })
            .unwrap();
        let app =
            App::with_store(one_shot_config(Config::default()), store, "/purchase-orders").unwrap();

        assert_eq!(app.invalidator.logout(), InvalidationOutcome::Navigated);
        assert_eq!(app.navigator.navigations().len(), 1);
        assert_eq!(app.store.access_token().unwrap(), None);
    }

    #[tokio::test]
    async fn test_default_grace_defers_navigation() {
        let app = App::with_store(Config::default(), CredentialStore::in_memory(), "/purchase-orders")
            .unwrap();
        assert_eq!(app.invalidator.logout(), InvalidationOutcome::Scheduled);
        assert!(app.navigator.navigations().is_empty());
    }
}
