//! Filesystem-backed content store.
//!
//! # Responsibilities
//! - Persist (status, headers, body) under the path derived by `path.rs`
//! - Read back both on-disk shapes (raw + `.meta` sidecar, or JSON document)
//! - Fast existence checks without decoding
//!
//! Writes go to a `.tmp` sibling and are renamed into place, so a reader
//! never observes a truncated file for a key. Two concurrent writers to the
//! same key race benignly: entries are idempotent snapshots and the last
//! write wins. A reader racing a writer on the raw shape may pair a new body
//! with an old sidecar during the write window; entries are typically
//! write-once, so the window is accepted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use indexmap::IndexMap;
use tokio::fs;

use crate::cache::encoding::detect_and_decode;
use crate::cache::entry::{CacheDocument, CacheEntry, MetaSidecar};
use crate::cache::path::{self, CachePath};
use crate::cache::CacheError;
use crate::http::headers::{clean_response_headers, to_ordered};

/// Durable key→(status, headers, body) storage rooted at a cache directory.
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open a store, creating the root directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist a response. `request_body` participates in the key for POST
    /// and must be the same bytes used to derive it elsewhere.
    ///
    /// Response headers are sanitized before persisting; the sanitizer is
    /// idempotent, so callers that already cleaned them lose nothing.
    pub async fn put(
        &self,
        url: &str,
        method: &Method,
        request_body: Option<&[u8]>,
        status_code: u16,
        headers: &HeaderMap,
        content: &[u8],
    ) -> Result<(), CacheError> {
        let cache_path = path::derive(&self.root, url, method, request_body)?;
        if let Some(parent) = cache_path.file().parent() {
            fs::create_dir_all(parent).await?;
        }
        let cleaned = to_ordered(&clean_response_headers(headers));

        match &cache_path {
            CachePath::Raw { file } => {
                write_atomic(file, content).await?;
                let sidecar = MetaSidecar {
                    status_code,
                    headers: cleaned,
                };
                let text = serde_json::to_string_pretty(&sidecar).map_err(CacheError::Encode)?;
                write_atomic(&path::meta_path(file), text.as_bytes()).await?;
            }
            CachePath::Document { file } => {
                let parts = path::extract_url_parts(url)?;
                let document = if *method == Method::POST {
                    CacheDocument {
                        status_code,
                        headers: cleaned,
                        content: detect_and_decode(content),
                        query_params: None,
                        request_body: Some(
                            request_body.map(detect_and_decode).unwrap_or_default(),
                        ),
                    }
                } else {
                    CacheDocument {
                        status_code,
                        headers: cleaned,
                        content: detect_and_decode(content),
                        query_params: parts.query,
                        request_body: None,
                    }
                };
                let text = serde_json::to_string_pretty(&document).map_err(CacheError::Encode)?;
                write_atomic(file, text.as_bytes()).await?;
            }
        }
        Ok(())
    }

    /// Read a cached response. `Ok(None)` is a miss; `Err(Corrupt)` means an
    /// entry exists but cannot be parsed (it is left on disk untouched).
    pub async fn get(
        &self,
        url: &str,
        method: &Method,
        request_body: Option<&[u8]>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let cache_path = path::derive(&self.root, url, method, request_body)?;

        match &cache_path {
            CachePath::Raw { file } => {
                let content = match fs::read(file).await {
                    Ok(bytes) => bytes,
                    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                    Err(err) => return Err(err.into()),
                };
                let meta_file = path::meta_path(file);
                // Entries written without a sidecar read back with defaults.
                let (status_code, headers) = match fs::read_to_string(&meta_file).await {
                    Ok(text) => {
                        let sidecar: MetaSidecar = serde_json::from_str(&text)
                            .map_err(|source| CacheError::Corrupt {
                                path: meta_file.clone(),
                                source,
                            })?;
                        (sidecar.status_code, sidecar.headers)
                    }
                    Err(err) if err.kind() == ErrorKind::NotFound => (200, IndexMap::new()),
                    Err(err) => return Err(err.into()),
                };
                Ok(Some(CacheEntry {
                    status_code,
                    headers,
                    body: Bytes::from(content),
                }))
            }
            CachePath::Document { file } => {
                let text = match fs::read_to_string(file).await {
                    Ok(text) => text,
                    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                    Err(err) => return Err(err.into()),
                };
                let document: CacheDocument =
                    serde_json::from_str(&text).map_err(|source| CacheError::Corrupt {
                        path: file.clone(),
                        source,
                    })?;
                Ok(Some(CacheEntry {
                    status_code: document.status_code,
                    headers: document.headers,
                    body: Bytes::from(document.content.into_bytes()),
                }))
            }
        }
    }

    /// Existence check without decoding, used ahead of a full read.
    pub async fn exists(
        &self,
        url: &str,
        method: &Method,
        request_body: Option<&[u8]>,
    ) -> Result<bool, CacheError> {
        let cache_path = path::derive(&self.root, url, method, request_body)?;
        Ok(fs::try_exists(cache_path.file()).await.unwrap_or(false))
    }
}

async fn write_atomic(file: &Path, contents: &[u8]) -> std::io::Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = file.with_file_name(format!("{name}.tmp"));
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, file).await
}
