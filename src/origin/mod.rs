//! Outbound fetch capability.
//!
//! Handlers talk to the origin through the [`Origin`] trait so the routing
//! logic can be exercised against a scripted origin in tests. The production
//! implementation wraps a reqwest client configured the way the proxy needs:
//! redirects are surfaced to the caller (so `Location` can be rewritten), and
//! compressed bodies arrive already decoded, which is why the response
//! sanitizer strips the framing headers.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use thiserror::Error;

/// A request to the origin: fully buffered, replayable.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A fully buffered origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Fetch failures. No retries happen at this layer or above.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("origin request timed out")]
    Timeout,

    #[error("origin request failed: {0}")]
    Network(String),
}

#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, request: OriginRequest) -> Result<OriginResponse, FetchError>;
}

/// reqwest-backed origin client.
pub struct HttpOrigin {
    client: reqwest::Client,
}

impl HttpOrigin {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, request: OriginRequest) -> Result<OriginResponse, FetchError> {
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(OriginResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}
