//! OrderDesk session core.
//!
//! This crate owns the session-validity and authenticated-request lifecycle
//! of the OrderDesk dashboard:
//!
//! - `storage`: the Credential Store (durable and session-scoped key/value stores)
//! - `auth`: token decoding, derived session state and the shared invalidation routine
//! - `monitor`: the periodic Session Monitor
//! - `api`: the Authenticated Request Gateway
//! - `config`: runtime configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod monitor;
pub mod storage;

pub use api::{ApiError, Gateway, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use auth::{
    InvalidReason, InvalidationOutcome, Invalidator, NavigationMode, Navigator, SessionCell,
    SessionState,
};
pub use config::Config;
pub use monitor::{PeriodicTask, SessionMonitor, TaskHandle};
pub use storage::{CredentialStore, KeyValueStore, LoginRecord, StoreError};
