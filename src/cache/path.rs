//! Cache path derivation.
//!
//! Maps (URL, method, body) onto a deterministic filesystem location under
//! the cache root. GET and POST live in segregated namespaces so their keys
//! can never collide; variable-length components (query strings, POST bodies)
//! are digested with MD5 instead of being embedded literally. MD5 is a dedup
//! hash here, not a security boundary.
//!
//! Layout, relative to the cache root:
//! ```text
//! {domain}/get/index.html                        GET /
//! {domain}/get/a/b.png                           GET /a/b.png
//! {domain}/get/a/b/index.html                    GET /a/b (no extension)
//! {domain}/get/params/{md5}.json                 GET /?q=...
//! {domain}/get/a/params/{md5}.json               GET /a/b.png?q=... or /a?q=...
//! {domain}/post/root/{md5}.json                  POST /
//! {domain}/post/api/{md5}.json                   POST /api
//! ```

use std::path::{Path, PathBuf};

use axum::http::Method;
use md5::{Digest, Md5};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::cache::CacheError;

pub const INDEX_FILE: &str = "index.html";
pub const META_SUFFIX: &str = ".meta";

const GET_DIR: &str = "get";
const POST_DIR: &str = "post";
const PARAMS_DIR: &str = "params";
const ROOT_DIR: &str = "root";
const JSON_EXT: &str = ".json";

/// A derived cache location, distinguishing the two on-disk shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePath {
    /// Raw body bytes plus a `.meta` sidecar holding status and headers.
    /// Used for GET without a query string, so binary assets round-trip
    /// byte-identically.
    Raw { file: PathBuf },

    /// A single JSON document embedding status, headers and text-decoded
    /// content. Used for GET with a query string and for POST.
    Document { file: PathBuf },
}

impl CachePath {
    pub fn file(&self) -> &Path {
        match self {
            CachePath::Raw { file } | CachePath::Document { file } => file,
        }
    }
}

/// Sidecar path for a raw entry: the full filename with `.meta` appended
/// (`b.png` → `b.png.meta`).
pub fn meta_path(file: &Path) -> PathBuf {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    file.with_file_name(format!("{name}{META_SUFFIX}"))
}

/// URL decomposed into the parts that participate in cache addressing.
#[derive(Debug, Clone)]
pub struct UrlParts {
    /// Authority, `host` or `host:port`.
    pub domain: String,
    /// Percent-decoded path segments, empty and `.` segments dropped.
    pub segments: Vec<String>,
    /// Raw query string as captured after `?`, `None` when absent or empty.
    pub query: Option<String>,
}

/// Split a URL into domain, path segments and query.
///
/// A cache key must never address a file outside the cache root: the URL
/// parser already resolves dot segments (including percent-encoded forms),
/// and any `..` segment that still shows up is rejected outright.
pub fn extract_url_parts(url: &str) -> Result<UrlParts, CacheError> {
    let parsed = Url::parse(url).map_err(|_| CacheError::InvalidUrl(url.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| CacheError::InvalidUrl(url.to_string()))?;
    let domain = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let decoded = percent_decode_str(parsed.path()).decode_utf8_lossy();
    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(CacheError::InvalidUrl(url.to_string())),
            other => segments.push(other.to_string()),
        }
    }

    let query = parsed.query().filter(|q| !q.is_empty()).map(str::to_owned);
    Ok(UrlParts {
        domain,
        segments,
        query,
    })
}

/// MD5 digest as a lowercase hex string.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Derive the cache path for a request. Pure: same inputs always yield the
/// same path, across calls and processes.
pub fn derive(
    cache_root: &Path,
    url: &str,
    method: &Method,
    body: Option<&[u8]>,
) -> Result<CachePath, CacheError> {
    let parts = extract_url_parts(url)?;
    if *method == Method::GET {
        Ok(derive_get(cache_root, &parts))
    } else if *method == Method::POST {
        Ok(derive_post(cache_root, &parts, body))
    } else {
        Err(CacheError::UnsupportedMethod(method.clone()))
    }
}

fn derive_get(cache_root: &Path, parts: &UrlParts) -> CachePath {
    let mut base = cache_root.join(&parts.domain);
    base.push(GET_DIR);

    match &parts.query {
        Some(query) => {
            let digest = md5_hex(query.as_bytes());
            let mut file = base;
            for segment in directory_segments(&parts.segments) {
                file.push(segment);
            }
            file.push(PARAMS_DIR);
            file.push(format!("{digest}{JSON_EXT}"));
            CachePath::Document { file }
        }
        None => {
            let mut file = base;
            match parts.segments.last() {
                None => file.push(INDEX_FILE),
                Some(last) => {
                    for segment in &parts.segments {
                        file.push(segment);
                    }
                    // An extensionless final segment is treated as a
                    // directory and stored under a synthetic index file.
                    if !has_extension(last) {
                        file.push(INDEX_FILE);
                    }
                }
            }
            CachePath::Raw { file }
        }
    }
}

fn derive_post(cache_root: &Path, parts: &UrlParts, body: Option<&[u8]>) -> CachePath {
    let digest = md5_hex(body.unwrap_or_default());
    let mut file = cache_root.join(&parts.domain);
    file.push(POST_DIR);
    if parts.segments.is_empty() {
        file.push(ROOT_DIR);
    } else {
        for segment in &parts.segments {
            file.push(segment);
        }
    }
    file.push(format!("{digest}{JSON_EXT}"));
    CachePath::Document { file }
}

/// Directory-equivalent of a path: the parent when the last segment names a
/// file (has an extension), the path itself otherwise.
fn directory_segments(segments: &[String]) -> &[String] {
    match segments.last() {
        Some(last) if has_extension(last) => &segments[..segments.len() - 1],
        _ => segments,
    }
}

fn has_extension(segment: &str) -> bool {
    segment.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/cache")
    }

    #[test]
    fn get_with_extension_maps_to_raw_file() {
        let path = derive(&root(), "http://origin/a/b.png", &Method::GET, None).unwrap();
        assert_eq!(
            path,
            CachePath::Raw {
                file: PathBuf::from("/cache/origin/get/a/b.png")
            }
        );
        assert_eq!(
            meta_path(path.file()),
            PathBuf::from("/cache/origin/get/a/b.png.meta")
        );
    }

    #[test]
    fn extensionless_path_becomes_directory_index() {
        let path = derive(&root(), "http://origin/docs/intro", &Method::GET, None).unwrap();
        assert_eq!(
            path.file(),
            Path::new("/cache/origin/get/docs/intro/index.html")
        );
    }

    #[test]
    fn root_path_maps_to_index() {
        let path = derive(&root(), "http://origin/", &Method::GET, None).unwrap();
        assert_eq!(path.file(), Path::new("/cache/origin/get/index.html"));
    }

    #[test]
    fn explicit_port_is_part_of_the_domain() {
        let path = derive(&root(), "http://origin:8080/x.js", &Method::GET, None).unwrap();
        assert_eq!(path.file(), Path::new("/cache/origin:8080/get/x.js"));
    }

    #[test]
    fn query_on_root_goes_under_params() {
        let path = derive(&root(), "http://origin/?q=cats", &Method::GET, None).unwrap();
        assert_eq!(
            path,
            CachePath::Document {
                file: PathBuf::from(
                    "/cache/origin/get/params/c121da5ff502fbccd07dc65a1f8e647f.json"
                )
            }
        );
    }

    #[test]
    fn query_on_file_path_uses_parent_directory() {
        let path = derive(&root(), "http://origin/a/b.png?a=1", &Method::GET, None).unwrap();
        assert_eq!(
            path.file(),
            Path::new("/cache/origin/get/a/params/3872c9ae3f427af0be0ead09d07ae2cf.json")
        );

        // A bare filename's parent is the get/ base itself.
        let bare = derive(&root(), "http://origin/b.png?a=1", &Method::GET, None).unwrap();
        assert_eq!(
            bare.file(),
            Path::new("/cache/origin/get/params/3872c9ae3f427af0be0ead09d07ae2cf.json")
        );
    }

    #[test]
    fn byte_different_queries_get_distinct_paths() {
        let one = derive(&root(), "http://origin/s?a=1", &Method::GET, None).unwrap();
        let two = derive(&root(), "http://origin/s?a=2", &Method::GET, None).unwrap();
        assert_ne!(one.file(), two.file());
    }

    #[test]
    fn derivation_is_stable_across_calls() {
        let url = "http://origin/search?q=cats";
        let first = derive(&root(), url, &Method::GET, None).unwrap();
        let second = derive(&root(), url, &Method::GET, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn post_body_digest_distinguishes_entries() {
        let one = derive(
            &root(),
            "http://origin/api",
            &Method::POST,
            Some(br#"{"x":1}"#),
        )
        .unwrap();
        let two = derive(
            &root(),
            "http://origin/api",
            &Method::POST,
            Some(br#"{"x":2}"#),
        )
        .unwrap();
        assert_eq!(
            one.file(),
            Path::new("/cache/origin/post/api/ac3ef48caa08fa3ed5e025da69edc645.json")
        );
        assert_ne!(one.file(), two.file());
    }

    #[test]
    fn post_without_path_or_body_uses_root_namespace() {
        let path = derive(&root(), "http://origin/", &Method::POST, None).unwrap();
        assert_eq!(
            path.file(),
            Path::new("/cache/origin/post/root/d41d8cd98f00b204e9800998ecf8427e.json")
        );
    }

    #[test]
    fn non_cacheable_method_is_rejected() {
        let err = derive(&root(), "http://origin/x", &Method::PUT, None).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedMethod(_)));
    }

    #[test]
    fn malformed_url_is_rejected() {
        assert!(matches!(
            derive(&root(), "not a url", &Method::GET, None),
            Err(CacheError::InvalidUrl(_))
        ));
    }

    #[test]
    fn traversal_segments_cannot_escape_the_cache_root() {
        // The URL parser resolves dot segments, encoded or not, before
        // derivation ever sees them.
        let path = derive(
            &root(),
            "http://origin/a/%2e%2e/%2e%2e/etc/passwd",
            &Method::GET,
            None,
        )
        .unwrap();
        assert!(path.file().starts_with("/cache/origin/get"));

        let plain = derive(&root(), "http://origin/a/../b.txt", &Method::GET, None).unwrap();
        assert_eq!(plain.file(), Path::new("/cache/origin/get/b.txt"));
    }

    #[test]
    fn percent_encoded_segments_are_decoded() {
        let path = derive(&root(), "http://origin/caf%C3%A9/menu.html", &Method::GET, None)
            .unwrap();
        assert_eq!(path.file(), Path::new("/cache/origin/get/café/menu.html"));
    }
}
