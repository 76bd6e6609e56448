//! Transport trait and the reqwest-backed implementation

use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use indexmap::IndexMap;

/// Transport-level failures (the request never produced a response)
///
/// Distinct from HTTP error statuses: a 4xx/5xx still yields an
/// [`ApiResponse`]; these errors mean the exchange itself broke.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Underlying HTTP client failure (DNS, connect, TLS, body read)
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The transport cannot serve the request
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Something that can perform one HTTP exchange
///
/// The runner only ever talks through this seam, so tests substitute a
/// scripted in-memory transport for the real client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and consume the full response
    async fn send(&self, req: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Production transport backed by `reqwest::Client`
///
/// When constructed with an API key, attaches it to every request as the
/// `x-api-key` header.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl ReqwestTransport {
    /// Create a transport with no implicit authentication
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that sends `x-api-key` on every request
    #[inline]
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Some(api_key.into()),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(req.method.into(), &req.url);

        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();

        let mut headers = IndexMap::new();
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                headers
                    .entry(name.as_str().to_string())
                    .or_insert_with(|| v.to_string());
            }
        }

        let body = resp.text().await?;

        Ok(ApiResponse {
            status,
            body,
            headers,
        })
    }
}
