use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::{debug, info};

use super::token::decode_claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Before the first check
    Unknown,
    Valid,
    /// Terminal for this instance; a new login needs a fresh start
    Invalid,
}

impl SessionState {
    fn as_u8(self) -> u8 {
        match self {
            SessionState::Unknown => 0,
            SessionState::Valid => 1,
            SessionState::Invalid => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Valid,
            2 => SessionState::Invalid,
            _ => SessionState::Unknown,
        }
    }
}

/// Why a session was invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// No credential while on a protected path
    Missing,
    /// Credential could not be decoded
    Malformed,
    Expired,
    /// Server answered 401 or 403
    Rejected(u16),
    /// No server response at all
    Unreachable,
    LoggedOut,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::Missing => write!(f, "credential missing"),
            InvalidReason::Malformed => write!(f, "credential malformed"),
            InvalidReason::Expired => write!(f, "credential expired"),
            InvalidReason::Rejected(status) => write!(f, "rejected by server ({})", status),
            InvalidReason::Unreachable => write!(f, "server unreachable"),
            InvalidReason::LoggedOut => write!(f, "logged out"),
        }
    }
}

/// Result of one validity evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// No credential, but already on the login path
    Idle,
    Invalid(InvalidReason),
}

/// Decide whether the current credential still describes a live session.
///
/// Pure: reads nothing but its arguments.
pub fn evaluate(token: Option<&str>, current_path: &str, login_path: &str, now_secs: i64) -> Verdict {
    let token = match token {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return if is_login_path(current_path, login_path) {
                Verdict::Idle
            } else {
                Verdict::Invalid(InvalidReason::Missing)
            };
        }
    };

    match decode_claims(token) {
        Ok(claims) if claims.is_expired_at(now_secs) => {
            debug!(exp = ?claims.exp, now = now_secs, "Credential expired");
            Verdict::Invalid(InvalidReason::Expired)
        }
        Ok(_) => Verdict::Valid,
        Err(e) => {
            debug!(error = %e, "Credential failed to decode");
            Verdict::Invalid(InvalidReason::Malformed)
        }
    }
}

fn is_login_path(current_path: &str, login_path: &str) -> bool {
    let trim = |p: &str| p.trim_end_matches('/').to_string();
    trim(current_path) == trim(login_path)
}

/// Process-wide session state plus the "already invalidating" guard.
#[derive(Debug)]
pub struct SessionCell {
    state: AtomicU8,
    invalidating: AtomicBool,
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Unknown.as_u8()),
            invalidating: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// `Unknown -> Valid`. Has no effect once the session is `Invalid`.
    pub fn mark_valid(&self) -> bool {
        let moved = self
            .state
            .compare_exchange(
                SessionState::Unknown.as_u8(),
                SessionState::Valid.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if moved {
            info!("Session is valid");
        }
        moved
    }

    pub fn mark_invalid(&self) {
        let previous = self.state.swap(SessionState::Invalid.as_u8(), Ordering::SeqCst);
        if previous != SessionState::Invalid.as_u8() {
            info!(from = ?SessionState::from_u8(previous), "Session is invalid");
        }
    }

    /// Claim the right to navigate away. Only the first caller gets `true`.
    pub fn begin_invalidating(&self) -> bool {
        self.invalidating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_invalidating(&self) -> bool {
        self.invalidating.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::encode_unsigned;
    use serde_json::json;

    const LOGIN: &str = "/auth/jwt/login";
    const NOW: i64 = 1_800_000_000;

    #[test]
    fn test_missing_token_on_protected_path() {
        assert_eq!(
            evaluate(None, "/dashboard/purchase-orders", LOGIN, NOW),
            Verdict::Invalid(InvalidReason::Missing)
        );
        assert_eq!(
            evaluate(Some("  "), "/dashboard", LOGIN, NOW),
            Verdict::Invalid(InvalidReason::Missing)
        );
    }

    #[test]
    fn test_missing_token_on_login_path_is_idle() {
        assert_eq!(evaluate(None, LOGIN, LOGIN, NOW), Verdict::Idle);
        assert_eq!(evaluate(None, "/auth/jwt/login/", LOGIN, NOW), Verdict::Idle);
    }

    #[test]
    fn test_future_exp_is_valid() {
        let token = encode_unsigned(&json!({"exp": NOW + 3600}));
        assert_eq!(evaluate(Some(&token), "/dashboard", LOGIN, NOW), Verdict::Valid);
    }

    #[test]
    fn test_past_exp_is_expired() {
        let token = encode_unsigned(&json!({"exp": NOW - 10}));
        assert_eq!(
            evaluate(Some(&token), "/dashboard", LOGIN, NOW),
            Verdict::Invalid(InvalidReason::Expired)
        );
    }

    #[test]
    fn test_malformed_token_is_invalid_even_on_login_path() {
        assert_eq!(
            evaluate(Some("garbage"), LOGIN, LOGIN, NOW),
            Verdict::Invalid(InvalidReason::Malformed)
        );
    }

    #[test]
    fn test_cell_transitions() {
        let cell = SessionCell::new();
        assert_eq!(cell.state(), SessionState::Unknown);
        assert!(cell.mark_valid());
        assert!(!cell.mark_valid());
        assert_eq!(cell.state(), SessionState::Valid);

        cell.mark_invalid();
        assert_eq!(cell.state(), SessionState::Invalid);
        // No way back within the same instance
        assert!(!cell.mark_valid());
        assert_eq!(cell.state(), SessionState::Invalid);
    }

    #[test]
    fn test_begin_invalidating_only_once() {
        let cell = SessionCell::new();
        assert!(cell.begin_invalidating());
        assert!(!cell.begin_invalidating());
        assert!(cell.is_invalidating());
    }
}
