//! The two interception stages, kept free of I/O.
//!
//! Outgoing: `attach_credential` adds the bearer token.
//! Incoming: `classify` sorts every response or failure into an `Outcome`.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::warn;

use super::error::{ApiError, TransportError};
use super::transport::{HttpRequest, HttpResponse};

/// Set `Authorization: Bearer <token>` when a token exists. Never fails:
/// without a usable token the request goes out unchanged.
pub fn attach_credential(mut request: HttpRequest, token: Option<&str>) -> HttpRequest {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return request;
    };
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers.insert(AUTHORIZATION, value);
        }
        Err(e) => warn!(error = %e, "Stored token is not a valid header value, sending without it"),
    }
    request
}

#[derive(Debug)]
pub enum Outcome {
    Success(HttpResponse),
    /// 401 or 403; carries the server's payload for the caller
    AuthRejected(ApiError),
    /// No structured server response
    ConnectivityLost(TransportError),
    /// Any other failure status
    Failed(ApiError),
}

/// Classify a transport result. One rule decides connectivity loss: the
/// transport produced no response.
pub fn classify(result: Result<HttpResponse, TransportError>) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => return Outcome::ConnectivityLost(e),
    };

    if response.status.is_success() {
        return Outcome::Success(response);
    }

    let status = response.status.as_u16();
    let error = ApiError::Status {
        status,
        body: response.body,
    };
    match status {
        401 | 403 => Outcome::AuthRejected(error),
        _ => Outcome::Failed(error),
    }
}
