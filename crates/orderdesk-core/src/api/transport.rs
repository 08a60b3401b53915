use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::TransportError;

/// An outgoing call before it reaches the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the API base URL, or an absolute URL
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What the server said, whatever the status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Moves a request to the backend. Interception happens around it, not in it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport over a pooled reqwest client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        // The server has answered; a broken body must not turn that into
        // a transport failure
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %url, status = status.as_u16(), error = %e, "Failed to read response body");
                String::new()
            }
        };
        debug!(url = %url, status = status.as_u16(), "Response received");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport =
            ReqwestTransport::new("https://erp.example.com/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            transport.url_for("/purchase-orders"),
            "https://erp.example.com/api/purchase-orders"
        );
        assert_eq!(
            transport.url_for("consignees/4"),
            "https://erp.example.com/api/consignees/4"
        );
        assert_eq!(
            transport.url_for("https://files.example.com/x"),
            "https://files.example.com/x"
        );
    }

    use crate::api::test_support::{closed_port, serve_once};

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let base = format!("http://127.0.0.1:{}", closed_port());
        let transport = ReqwestTransport::new(base, Duration::from_secs(5)).unwrap();
        let result = transport.send(HttpRequest::get("/ping")).await;
        assert!(matches!(result, Err(TransportError::Http(_))));
    }

    #[tokio::test]
    async fn test_truncated_body_keeps_status() {
        let base = serve_once("HTTP/1.1 401 Unauthorized\r\nContent-Length: 100\r\n\r\n{\"message\"");
        let transport = ReqwestTransport::new(base, Duration::from_secs(5)).unwrap();

        let response = transport.send(HttpRequest::get("/consignees")).await.unwrap();
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body, "");
    }
}
