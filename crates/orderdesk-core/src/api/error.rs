use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Failure below HTTP: no structured server response exists.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport failure: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status. `body` is the
    /// server's payload, untouched.
    #[error("Request failed with status {status}: {}", truncate_body(.body))]
    Status { status: u16, body: String },

    /// Generic connectivity marker. The underlying transport error is
    /// logged, not surfaced.
    #[error("Network error - the server could not be reached")]
    Connectivity,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401 and 403.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// The server payload as JSON, when it is JSON.
    pub fn payload_json(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut cut = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
}
