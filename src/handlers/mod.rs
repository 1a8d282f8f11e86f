//! Per-request routing variants.
//!
//! One interface, three implementations:
//! ```text
//! inbound request → Dispatcher → {ProxyHandler | LocalHandler | HybridHandler}
//!     → {cache read, origin fetch, cache write} → sanitized response
//! ```
//!
//! The variant is chosen once at startup from the configured mode. Shared
//! behavior (URL building, header cleanup, response assembly) lives in
//! `crate::http`, not in a handler hierarchy.

pub mod hybrid;
pub mod local;
pub mod proxy;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use thiserror::Error;

use crate::cache::CacheStore;
use crate::config::schema::{MirrorConfig, RunMode};
use crate::http::Outbound;
use crate::origin::HttpOrigin;

pub use hybrid::HybridHandler;
pub use local::LocalHandler;
pub use proxy::ProxyHandler;

/// Key-derivation anchor when no origin is configured in local mode.
const DEFAULT_LOCAL_ORIGIN: &str = "http://localhost";

/// An inbound request with its body fully buffered. The body is read exactly
/// once by the server layer; handlers reuse the same bytes for key
/// derivation and the origin fetch.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Request path without the leading slash.
    pub path: String,
    /// Raw query string, as received.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    /// The body bytes that participate in the cache key: POST bodies do,
    /// everything else keys on the URL alone.
    pub fn cache_body(&self) -> Option<&[u8]> {
        if self.method == Method::POST {
            Some(self.body.as_ref())
        } else {
            None
        }
    }
}

/// Only GET and POST responses are ever cached.
pub fn is_cacheable(method: &Method) -> bool {
    *method == Method::GET || *method == Method::POST
}

#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: InboundRequest) -> Outbound;
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("origin base url is required in {0} mode")]
    MissingOrigin(RunMode),

    #[error("failed to build origin client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Selects the handler variant for the process. A single branch at startup;
/// the mode is never renegotiated per request.
#[derive(Clone)]
pub struct Dispatcher {
    handler: Arc<dyn RequestHandler>,
}

impl Dispatcher {
    pub fn from_config(config: &MirrorConfig, store: Arc<CacheStore>) -> Result<Self, DispatchError> {
        let timeout = Duration::from_secs(config.timeouts.request_secs);
        let handler: Arc<dyn RequestHandler> = match config.mode {
            RunMode::Proxy => {
                let base_url = required_origin(config)?;
                let origin = Arc::new(HttpOrigin::new(timeout)?);
                Arc::new(ProxyHandler::new(base_url, store, origin))
            }
            RunMode::Local => {
                let base_url = config
                    .origin
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LOCAL_ORIGIN.to_string());
                Arc::new(LocalHandler::new(base_url, store))
            }
            RunMode::Hybrid => {
                let base_url = required_origin(config)?;
                let origin = Arc::new(HttpOrigin::new(timeout)?);
                Arc::new(HybridHandler::new(base_url, store, origin))
            }
        };
        Ok(Self { handler })
    }

    /// Wrap an already constructed handler, used by tests to inject a
    /// scripted origin.
    pub fn from_handler(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }

    pub async fn dispatch(&self, request: InboundRequest) -> Outbound {
        self.handler.handle(request).await
    }
}

fn required_origin(config: &MirrorConfig) -> Result<String, DispatchError> {
    config
        .origin
        .base_url
        .clone()
        .ok_or(DispatchError::MissingOrigin(config.mode))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http::{HeaderMap, Method, StatusCode};
    use bytes::Bytes;

    use crate::origin::{FetchError, Origin, OriginRequest, OriginResponse};

    use super::InboundRequest;

    /// Scripted origin: returns a canned result and records every request.
    pub struct MockOrigin {
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<OriginRequest>>,
        result: Result<OriginResponse, FetchError>,
    }

    impl MockOrigin {
        pub fn responding(status: u16, headers: HeaderMap, body: &[u8]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                result: Ok(OriginResponse {
                    status: StatusCode::from_u16(status).unwrap(),
                    headers,
                    body: Bytes::copy_from_slice(body),
                }),
            }
        }

        pub fn failing(error: FetchError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                result: Err(error),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Origin for MockOrigin {
        async fn fetch(&self, request: OriginRequest) -> Result<OriginResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            self.result.clone()
        }
    }

    pub fn get_request(path: &str, query: Option<&str>) -> InboundRequest {
        InboundRequest {
            method: Method::GET,
            path: path.to_string(),
            query: query.map(str::to_owned),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn post_request(path: &str, body: &[u8]) -> InboundRequest {
        InboundRequest {
            method: Method::POST,
            path: path.to_string(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body),
        }
    }
}
