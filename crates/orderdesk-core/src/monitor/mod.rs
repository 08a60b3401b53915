//! Session Monitor: a cancellable periodic validity check.

pub mod periodic;
pub mod session_monitor;

pub use periodic::{PeriodicTask, TaskHandle};
pub use session_monitor::SessionMonitor;
