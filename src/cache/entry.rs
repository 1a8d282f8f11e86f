//! Persisted cache schema.
//!
//! Field names and layout are load-bearing: existing caches on disk use
//! exactly `status_code`, `headers`, `content`, `query_params` and
//! `request_body`, serialized as 2-space pretty JSON. Reads are lenient —
//! absent fields fall back to defaults, matching entries written by older
//! versions.

use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A cached response as handed back to request handlers.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status_code: u16,
    /// Lowercase header names, insertion order preserved.
    pub headers: IndexMap<String, String>,
    pub body: Bytes,
}

/// Sidecar metadata stored next to a raw GET body (`<file>.meta`).
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaSidecar {
    #[serde(default = "default_status")]
    pub status_code: u16,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

/// Single-document shape used for GET-with-query and POST entries. The
/// request identity (`query_params` or `request_body`) is echoed into the
/// document so an entry can be traced back to the request that produced it.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheDocument {
    #[serde(default = "default_status")]
    pub status_code: u16,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
}

fn default_status() -> u16 {
    200
}
