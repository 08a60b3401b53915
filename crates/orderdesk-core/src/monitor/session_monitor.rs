use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use super::periodic::{PeriodicTask, TaskHandle};
use crate::auth::{evaluate, Invalidator, NavigationMode, Navigator, Verdict};
use crate::config::Config;
use crate::storage::CredentialStore;

/// Proactively checks the stored credential so no authenticated view
/// outlives it, independent of any HTTP traffic.
pub struct SessionMonitor {
    store: CredentialStore,
    navigator: Arc<dyn Navigator>,
    invalidator: Invalidator,
    interval: Duration,
}

impl SessionMonitor {
    pub fn new(
        store: CredentialStore,
        navigator: Arc<dyn Navigator>,
        invalidator: Invalidator,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            navigator,
            invalidator,
            interval,
        }
    }

    pub fn from_config(
        config: &Config,
        store: CredentialStore,
        navigator: Arc<dyn Navigator>,
        invalidator: Invalidator,
    ) -> Self {
        Self::new(store, navigator, invalidator, config.check_interval())
    }

    /// One evaluation cycle. Never fails; the verdict is returned for
    /// callers that want to report it.
    pub fn check_now(&self) -> Verdict {
        let token = match self.store.access_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read credential, treating as absent");
                None
            }
        };
        let path = self.navigator.current_path();
        let verdict = evaluate(
            token.as_deref(),
            &path,
            self.invalidator.login_path(),
            Utc::now().timestamp(),
        );

        match verdict {
            Verdict::Valid => {
                self.invalidator.cell().mark_valid();
            }
            Verdict::Idle => debug!(path = %path, "No credential on login path"),
            Verdict::Invalid(reason) => {
                self.invalidator.invalidate(reason, NavigationMode::Normal);
            }
        }
        verdict
    }

    /// Check now, then every interval until the handle is stopped.
    pub fn start(self: Arc<Self>) -> TaskHandle {
        debug!(interval_secs = self.interval.as_secs(), "Starting session monitor");
        PeriodicTask::spawn(self.interval, move || {
            self.check_now();
        })
    }
}
