//! Session validity: token decoding, derived state and invalidation.
//!
//! This module provides:
//! - `token`: unverified JWT payload decoding (`exp`, `sub`)
//! - `session`: `SessionState`, the shared `SessionCell` and the pure `evaluate`
//! - `invalidation`: the idempotent clear-and-redirect routine
//! - `navigation`: the `Navigator` seam and a headless implementation

pub mod invalidation;
pub mod navigation;
pub mod session;
pub mod token;

pub use invalidation::{InvalidationOutcome, Invalidator};
pub use navigation::{HeadlessNavigator, Navigation, NavigationMode, Navigator};
pub use session::{evaluate, InvalidReason, SessionCell, SessionState, Verdict};
pub use token::{decode_claims, TokenClaims, TokenError};
