//! Hybrid mode: cache first, proxy on miss.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::cache::{CacheError, CacheStore};
use crate::handlers::{is_cacheable, InboundRequest, ProxyHandler, RequestHandler};
use crate::http::headers::to_header_map;
use crate::http::response::{build_response, Outbound};
use crate::http::url::build_full_url;
use crate::origin::Origin;

pub struct HybridHandler {
    origin_base: String,
    store: Arc<CacheStore>,
    proxy: ProxyHandler,
}

impl HybridHandler {
    pub fn new(origin_base: impl Into<String>, store: Arc<CacheStore>, origin: Arc<dyn Origin>) -> Self {
        let origin_base = origin_base.into().trim_end_matches('/').to_string();
        let proxy = ProxyHandler::new(origin_base.clone(), store.clone(), origin);
        Self {
            origin_base,
            store,
            proxy,
        }
    }
}

#[async_trait]
impl RequestHandler for HybridHandler {
    async fn handle(&self, request: InboundRequest) -> Outbound {
        let url = build_full_url(&self.origin_base, &request.path, request.query.as_deref());
        tracing::info!(method = %request.method, url = %url, "hybrid mode request");

        if !is_cacheable(&request.method) {
            tracing::error!(method = %request.method, "method has no cache key");
            return Outbound::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unsupported method: {}", request.method),
            );
        }

        let exists = match self
            .store
            .exists(&url, &request.method, request.cache_body())
            .await
        {
            Ok(exists) => exists,
            Err(error @ CacheError::InvalidUrl(_)) => {
                tracing::warn!(url = %url, "request maps to no cache key");
                return Outbound::text(StatusCode::BAD_REQUEST, error.to_string());
            }
            // An unreadable cache is a miss; the proxy flow still works.
            Err(_) => false,
        };

        if exists {
            match self
                .store
                .get(&url, &request.method, request.cache_body())
                .await
            {
                Ok(Some(entry)) => {
                    tracing::info!(url = %url, "cache hit, using local cache");
                    return build_response(
                        entry.status_code,
                        to_header_map(&entry.headers),
                        entry.body,
                        Some(&request.path),
                    );
                }
                // The entry vanished between the existence check and the
                // read; treat it as a miss.
                Ok(None) => {}
                Err(error) => {
                    tracing::error!(url = %url, error = %error, "cache read failed");
                    return Outbound::text(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Cache read error: {error}"),
                    );
                }
            }
        }

        tracing::info!(url = %url, "cache miss, proxying request");
        // The body is already buffered, so the proxy flow can replay it.
        self.proxy.handle(request).await
    }
}
