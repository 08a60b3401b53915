//! Authenticated Request Gateway.
//!
//! Every screen-level call goes through `Gateway::execute`: the stored
//! credential is attached on the way out, and the response is classified on
//! the way back. Authentication loss and connectivity loss both converge on
//! the shared `Invalidator`; the caller still gets an error to show.

use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::error::ApiError;
use super::pipeline::{attach_credential, classify, Outcome};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::auth::{InvalidReason, Invalidator, NavigationMode};
use crate::config::Config;
use crate::storage::{CredentialStore, LoginRecord};

/// Shared client configuration. Clone is cheap.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    invalidator: Invalidator,
    login_endpoint: String,
}

impl Gateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: CredentialStore,
        invalidator: Invalidator,
        login_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            invalidator,
            login_endpoint: login_endpoint.into(),
        }
    }

    /// Gateway over a reqwest transport built from `config`.
    pub fn from_config(
        config: &Config,
        store: CredentialStore,
        invalidator: Invalidator,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.request_timeout())
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(Self::new(
            Arc::new(transport),
            store,
            invalidator,
            &config.login_endpoint,
        ))
    }

    /// Send a request through both interception stages.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let token = match self.store.access_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read credential, sending unauthenticated");
                None
            }
        };
        let request = attach_credential(request, token.as_deref());
        let path = request.path.clone();

        match classify(self.transport.send(request).await) {
            Outcome::Success(response) => Ok(response),
            Outcome::AuthRejected(error) => {
                let status = error.status().unwrap_or_default();
                warn!(path = %path, status, "Request rejected, credential no longer accepted");
                self.invalidator
                    .invalidate(InvalidReason::Rejected(status), NavigationMode::Normal);
                Err(error)
            }
            Outcome::ConnectivityLost(cause) => {
                warn!(path = %path, error = %cause, "No response from server");
                self.invalidator
                    .invalidate(InvalidReason::Unreachable, NavigationMode::Forced);
                Err(ApiError::Connectivity)
            }
            Outcome::Failed(error) => {
                debug!(path = %path, error = %error, "Request failed");
                Err(error)
            }
        }
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.execute(HttpRequest::get(path)).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError> {
        self.execute(HttpRequest::new(Method::POST, path).with_body(to_value(body)?))
            .await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError> {
        self.execute(HttpRequest::new(Method::PUT, path).with_body(to_value(body)?))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.execute(HttpRequest::new(Method::DELETE, path)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.get(path).await?;
        parse_body(&response, path)
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.post(path, body).await?;
        parse_body(&response, path)
    }

    /// Exchange a username and password for a token and store the login.
    ///
    /// A rejection here is a wrong password, not a lost session, so this call
    /// skips invalidation and hands every failure back to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<LoginRecord, ApiError> {
        let request = HttpRequest::post(
            self.login_endpoint.as_str(),
            serde_json::json!({ "username": username, "password": password }),
        );

        let response = match classify(self.transport.send(request).await) {
            Outcome::Success(response) => response,
            Outcome::AuthRejected(error) | Outcome::Failed(error) => return Err(error),
            Outcome::ConnectivityLost(cause) => {
                warn!(error = %cause, "Login endpoint unreachable");
                return Err(ApiError::Connectivity);
            }
        };

        let record: LoginRecord = parse_body(&response, &self.login_endpoint)?;
        self.store
            .establish(&record)
            .map_err(|e| ApiError::InvalidResponse(format!("Could not store login: {}", e)))?;
        debug!(username, "Authenticated");
        Ok(record)
    }
}

fn to_value<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse, path: &str) -> Result<T, ApiError> {
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, path)))
}
