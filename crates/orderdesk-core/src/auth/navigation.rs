use std::sync::{Mutex, MutexGuard};

use tracing::info;

/// Hard navigation primitive owned by the host.
///
/// `assign` leaves a history entry, `replace` does not. Both discard any
/// in-memory view state.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn assign(&self, path: &str);
    fn replace(&self, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Normal,
    /// Connectivity loss: bypass history
    Forced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub mode: NavigationMode,
}

/// Navigator for hosts without a document: tracks the current path and
/// remembers every navigation.
#[derive(Debug)]
pub struct HeadlessNavigator {
    inner: Mutex<HeadlessState>,
}

#[derive(Debug)]
struct HeadlessState {
    current: String,
    history: Vec<Navigation>,
}

impl HeadlessNavigator {
    pub fn new(start_path: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(HeadlessState {
                current: start_path.into(),
                history: Vec::new(),
            }),
        }
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.state().history.clone()
    }

    pub fn set_path(&self, path: impl Into<String>) {
        self.state().current = path.into();
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn go(&self, path: &str, mode: NavigationMode) {
        let mut state = self.state();
        info!(from = %state.current, to = path, ?mode, "Navigating");
        state.current = path.to_string();
        state.history.push(Navigation {
            path: path.to_string(),
            mode,
        });
    }
}

impl Navigator for HeadlessNavigator {
    fn current_path(&self) -> String {
        self.state().current.clone()
    }

    fn assign(&self, path: &str) {
        self.go(path, NavigationMode::Normal);
    }

    fn replace(&self, path: &str) {
        self.go(path, NavigationMode::Forced);
    }
}
