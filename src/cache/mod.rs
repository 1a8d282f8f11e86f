//! On-disk response cache.
//!
//! # Data Flow
//! ```text
//! (url, method, body)
//!     → path.rs (deterministic cache path, MD5 for query/body identity)
//!     → store.rs (filesystem read/write of the two entry shapes)
//!     → entry.rs (persisted schema: raw body + .meta sidecar, or JSON document)
//! ```
//!
//! A cache miss is control flow (`Ok(None)`), not an error. Entries are
//! idempotent snapshots: overwriting an existing key is last-write-wins.

pub mod encoding;
pub mod entry;
pub mod path;
pub mod store;

use std::path::PathBuf;

use axum::http::Method;
use thiserror::Error;

pub use entry::CacheEntry;
pub use path::CachePath;
pub use store::CacheStore;

/// Errors from cache addressing and storage.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The request URL could not be parsed into (domain, path, query), or its
    /// decoded path escapes the cache tree.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A cache key was requested for a method that is never cached. Callers
    /// must gate on GET/POST before deriving keys.
    #[error("method not cacheable: {0}")]
    UnsupportedMethod(Method),

    /// An entry exists on disk but its structured document is unparseable.
    /// The file is left as-is for manual inspection.
    #[error("corrupt cache entry at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode cache entry: {0}")]
    Encode(serde_json::Error),

    #[error("cache i/o error: {0}")]
    Io(#[from] std::io::Error),
}
