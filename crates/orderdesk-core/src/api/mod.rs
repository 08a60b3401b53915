//! Authenticated Request Gateway.
//!
//! This module provides the `Gateway` every screen-level call goes through,
//! the `Transport` seam it sends over, and the pure interception stages
//! (`attach_credential`, `classify`) between them.
//!
//! The backend accepts `Authorization: Bearer <token>` and answers 401 or
//! 403 when the token is no longer good.

pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use error::{ApiError, TransportError};
pub use gateway::Gateway;
pub use pipeline::{attach_credential, classify, Outcome};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
