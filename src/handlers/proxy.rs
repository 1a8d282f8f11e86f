//! Proxy mode: always fetch from the origin, cache as a side effect.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::{HeaderValue, LOCATION};
use axum::http::StatusCode;

use crate::cache::CacheStore;
use crate::handlers::{is_cacheable, InboundRequest, RequestHandler};
use crate::http::headers::{clean_request_headers, clean_response_headers, rewrite_location};
use crate::http::response::{build_response, Outbound};
use crate::http::url::build_full_url;
use crate::origin::{FetchError, Origin, OriginRequest};

pub struct ProxyHandler {
    origin_base: String,
    store: Arc<CacheStore>,
    origin: Arc<dyn Origin>,
}

impl ProxyHandler {
    pub fn new(origin_base: impl Into<String>, store: Arc<CacheStore>, origin: Arc<dyn Origin>) -> Self {
        Self {
            origin_base: origin_base.into().trim_end_matches('/').to_string(),
            store,
            origin,
        }
    }
}

#[async_trait]
impl RequestHandler for ProxyHandler {
    async fn handle(&self, request: InboundRequest) -> Outbound {
        let url = build_full_url(&self.origin_base, &request.path, request.query.as_deref());
        tracing::info!(method = %request.method, url = %url, "proxying request");

        let upstream = self
            .origin
            .fetch(OriginRequest {
                method: request.method.clone(),
                url: url.clone(),
                headers: clean_request_headers(&request.headers),
                body: request.body.clone(),
            })
            .await;

        let mut upstream = match upstream {
            Ok(upstream) => upstream,
            Err(FetchError::Timeout) => {
                tracing::error!(url = %url, "origin request timed out");
                return Outbound::text(StatusCode::GATEWAY_TIMEOUT, "Request timeout");
            }
            Err(FetchError::Network(error)) => {
                tracing::error!(url = %url, error = %error, "origin request failed");
                return Outbound::text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Proxy error: {error}"),
                );
            }
        };

        tracing::debug!(
            status = %upstream.status,
            content_length = upstream.body.len(),
            "origin response"
        );

        // Redirects pointing back at the origin must keep the client on the
        // proxy.
        if let Some(location) = upstream
            .headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
        {
            let (rewritten, changed) = rewrite_location(&location, &self.origin_base);
            if changed {
                tracing::info!(from = %location, to = %rewritten, "rewriting location header");
                if let Ok(value) = HeaderValue::from_str(&rewritten) {
                    upstream.headers.insert(LOCATION, value);
                }
            }
        }

        let headers = clean_response_headers(&upstream.headers);

        if is_cacheable(&request.method) {
            let write = self
                .store
                .put(
                    &url,
                    &request.method,
                    request.cache_body(),
                    upstream.status.as_u16(),
                    &headers,
                    &upstream.body,
                )
                .await;
            match write {
                Ok(()) => tracing::debug!(url = %url, "response cached"),
                // A failed cache write must never fail the client request.
                Err(error) => {
                    tracing::warn!(url = %url, error = %error, "failed to cache response")
                }
            }
        }

        build_response(upstream.status.as_u16(), headers, upstream.body, None)
    }
}
