use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::navigation::{NavigationMode, Navigator};
use super::session::{InvalidReason, SessionCell};
use crate::storage::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationOutcome {
    /// Storage cleared and navigation performed right away
    Navigated,
    /// Storage cleared, navigation runs after the grace period
    Scheduled,
    /// Storage cleared; another trigger already owns the navigation
    AlreadyInvalidating,
}

/// The one routine every trigger converges on: clear, mark invalid, redirect.
///
/// Clone is cheap; everything inside is shared.
#[derive(Clone)]
pub struct Invalidator {
    store: CredentialStore,
    navigator: Arc<dyn Navigator>,
    cell: Arc<SessionCell>,
    login_path: String,
    grace: Duration,
}

impl Invalidator {
    pub fn new(
        store: CredentialStore,
        navigator: Arc<dyn Navigator>,
        cell: Arc<SessionCell>,
        login_path: impl Into<String>,
        grace: Duration,
    ) -> Self {
        Self {
            store,
            navigator,
            cell,
            login_path: login_path.into(),
            grace,
        }
    }

    pub fn cell(&self) -> &Arc<SessionCell> {
        &self.cell
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Safe to call any number of times. Storage is cleared on every call;
    /// only the first call navigates.
    pub fn invalidate(&self, reason: InvalidReason, mode: NavigationMode) -> InvalidationOutcome {
        warn!(%reason, ?mode, "Invalidating session");

        if let Err(e) = self.store.clear_all() {
            warn!(error = %e, "Credential store not fully cleared");
        }
        self.cell.mark_invalid();

        if !self.cell.begin_invalidating() {
            debug!(%reason, "Redirect already in progress");
            return InvalidationOutcome::AlreadyInvalidating;
        }

        if self.grace.is_zero() {
            self.navigate(mode);
            return InvalidationOutcome::Navigated;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let this = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(this.grace).await;
                    this.navigate(mode);
                });
                InvalidationOutcome::Scheduled
            }
            Err(_) => {
                // No runtime to wait on; go now
                self.navigate(mode);
                InvalidationOutcome::Navigated
            }
        }
    }

    /// Explicit logout.
    pub fn logout(&self) -> InvalidationOutcome {
        self.invalidate(InvalidReason::LoggedOut, NavigationMode::Normal)
    }

    fn navigate(&self, mode: NavigationMode) {
        match mode {
            NavigationMode::Normal => self.navigator.assign(&self.login_path),
            NavigationMode::Forced => self.navigator.replace(&self.login_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::navigation::{HeadlessNavigator, Navigation};
    use crate::auth::SessionState;
    use crate::storage::{LoginRecord, SESSION_KEYS};

    const LOGIN: &str = "/auth/jwt/login";

    fn setup(grace: Duration) -> (Invalidator, CredentialStore, Arc<HeadlessNavigator>) {
        let store = CredentialStore::in_memory();
        store
            .establish(&LoginRecord {
                access_token: "tok".to_string(),
                role_id: Some("2".to_string()),
                user_code: Some("U9".to_string()),
                designation: Some("QA".to_string()),
            })
            .unwrap();
        let navigator = Arc::new(HeadlessNavigator::new("/dashboard"));
        let invalidator = Invalidator::new(
            store.clone(),
            navigator.clone(),
            Arc::new(SessionCell::new()),
            LOGIN,
            grace,
        );
        (invalidator, store, navigator)
    }

    #[test]
    fn test_invalidate_clears_and_redirects() {
        let (invalidator, store, navigator) = setup(Duration::ZERO);
        let outcome = invalidator.invalidate(InvalidReason::Expired, NavigationMode::Normal);

        assert_eq!(outcome, InvalidationOutcome::Navigated);
        for key in SESSION_KEYS {
            assert_eq!(store.attribute(key).unwrap(), None);
        }
        assert_eq!(navigator.current_path(), LOGIN);
        assert_eq!(invalidator.cell().state(), SessionState::Invalid);
    }

    #[test]
    fn test_invalidate_twice_navigates_once() {
        let (invalidator, store, navigator) = setup(Duration::ZERO);
        invalidator.invalidate(InvalidReason::Rejected(401), NavigationMode::Normal);
        let second = invalidator.invalidate(InvalidReason::Rejected(401), NavigationMode::Normal);

        assert_eq!(second, InvalidationOutcome::AlreadyInvalidating);
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(navigator.navigations().len(), 1);
    }

    #[test]
    fn test_forced_mode_replaces() {
        let (invalidator, _, navigator) = setup(Duration::ZERO);
        invalidator.invalidate(InvalidReason::Unreachable, NavigationMode::Forced);
        assert_eq!(
            navigator.navigations(),
            vec![Navigation {
                path: LOGIN.to_string(),
                mode: NavigationMode::Forced,
            }]
        );
    }

    #[test]
    fn test_logout_uses_normal_navigation() {
        let (invalidator, store, navigator) = setup(Duration::ZERO);
        invalidator.logout();
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(navigator.navigations()[0].mode, NavigationMode::Normal);
    }

    #[test]
    fn test_failed_clear_still_navigates() {
        use crate::storage::testing::UnclearableStore;
        use crate::storage::{KeyValueStore, MemoryStore};

        let session = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(Arc::new(UnclearableStore::default()), session.clone());
        store
            .establish(&LoginRecord {
                access_token: "tok".to_string(),
                role_id: None,
                user_code: None,
                designation: None,
            })
            .unwrap();
        let navigator = Arc::new(HeadlessNavigator::new("/dashboard"));
        let invalidator = Invalidator::new(
            store,
            navigator.clone(),
            Arc::new(SessionCell::new()),
            LOGIN,
            Duration::ZERO,
        );

        let outcome = invalidator.invalidate(InvalidReason::Expired, NavigationMode::Normal);
        assert_eq!(outcome, InvalidationOutcome::Navigated);
        assert_eq!(session.get("accessToken").unwrap(), None);
        assert_eq!(navigator.current_path(), LOGIN);
        assert_eq!(invalidator.cell().state(), SessionState::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_waits_for_grace_period() {
        let (invalidator, store, navigator) = setup(Duration::from_millis(500));
        let outcome = invalidator.invalidate(InvalidReason::Expired, NavigationMode::Normal);

        assert_eq!(outcome, InvalidationOutcome::Scheduled);
        // Storage is cleared immediately, navigation is not
        assert_eq!(store.access_token().unwrap(), None);
        assert!(navigator.navigations().is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(navigator.navigations().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(navigator.current_path(), LOGIN);
    }
}
