//! Unverified decoding of JWT access tokens.
//!
//! The backend verifies signatures; the client only needs the payload to
//! learn when the token expires.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token has {0} segments, expected 3")]
    SegmentCount(usize),

    #[error("Token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token payload is not a JSON object")]
    NotAnObject,

    #[error("Token claim `{0}` has the wrong type")]
    ClaimType(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiration instant, Unix seconds
    pub exp: Option<i64>,
    pub sub: Option<String>,
    /// Every other claim, kept for diagnostics
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// True when `exp` is present and not after `now_secs`.
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp.map(|exp| exp <= now_secs).unwrap_or(false)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Seconds until expiry, clamped at zero. `None` when the token has no `exp`.
    pub fn seconds_remaining(&self, now_secs: i64) -> Option<i64> {
        self.exp.map(|exp| (exp - now_secs).max(0))
    }
}

/// Decode the payload segment of a `header.payload.signature` token.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::SegmentCount(segments.len()));
    }

    // Some issuers pad the payload even though the format says not to
    let payload = URL_SAFE_NO_PAD.decode(segments[1].trim_end_matches('='))?;
    let mut claims = match serde_json::from_slice::<Value>(&payload)? {
        Value::Object(map) => map,
        _ => return Err(TokenError::NotAnObject),
    };

    let exp = match claims.remove("exp") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => {
            let secs = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.floor() as i64))
                .ok_or(TokenError::ClaimType("exp"))?;
            Some(secs)
        }
        Some(_) => return Err(TokenError::ClaimType("exp")),
    };

    let sub = match claims.remove("sub") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    };

    Ok(TokenClaims {
        exp,
        sub,
        extra: claims,
    })
}

/// Build an unsigned token carrying `payload`.
#[cfg(test)]
pub(crate) fn encode_unsigned(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.", header, body)
}
