//! Local mode: serve purely from cache, never touch an origin.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::cache::{CacheError, CacheStore};
use crate::handlers::{is_cacheable, InboundRequest, RequestHandler};
use crate::http::headers::to_header_map;
use crate::http::response::{build_response, Outbound};
use crate::http::url::build_full_url;

pub struct LocalHandler {
    origin_base: String,
    store: Arc<CacheStore>,
}

impl LocalHandler {
    pub fn new(origin_base: impl Into<String>, store: Arc<CacheStore>) -> Self {
        Self {
            origin_base: origin_base.into().trim_end_matches('/').to_string(),
            store,
        }
    }
}

#[async_trait]
impl RequestHandler for LocalHandler {
    async fn handle(&self, request: InboundRequest) -> Outbound {
        let url = build_full_url(&self.origin_base, &request.path, request.query.as_deref());
        tracing::info!(method = %request.method, url = %url, "local mode request");

        // Cache keys only exist for GET/POST; anything else reaching a
        // cache-only deployment is a caller bug.
        if !is_cacheable(&request.method) {
            tracing::error!(method = %request.method, "method has no cache key");
            return Outbound::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unsupported method: {}", request.method),
            );
        }

        match self.store.get(&url, &request.method, request.cache_body()).await {
            Ok(Some(entry)) => {
                tracing::info!(url = %url, status = entry.status_code, "returning cached response");
                build_response(
                    entry.status_code,
                    to_header_map(&entry.headers),
                    entry.body,
                    Some(&request.path),
                )
            }
            Ok(None) => {
                tracing::warn!(url = %url, "cache not found");
                Outbound::text(
                    StatusCode::NOT_FOUND,
                    format!("Cache not found for: {}", request.path),
                )
            }
            Err(error @ CacheError::InvalidUrl(_)) => {
                tracing::warn!(url = %url, "request maps to no cache key");
                Outbound::text(StatusCode::BAD_REQUEST, error.to_string())
            }
            Err(error) => {
                tracing::error!(url = %url, error = %error, "cache read failed");
                Outbound::text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Cache read error: {error}"),
                )
            }
        }
    }
}
