//! Header sanitizing and rewriting.
//!
//! Pure, idempotent functions. Header names are case-insensitive throughout:
//! `HeaderMap` normalizes to lowercase on insert, and the persisted form uses
//! lowercase keys in insertion order.

use axum::http::header::{
    HeaderName, HeaderValue, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, HOST, TRANSFER_ENCODING,
};
use axum::http::HeaderMap;
use indexmap::IndexMap;

/// Strip transport-hop request headers that must never reach the origin.
pub fn clean_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut cleaned = headers.clone();
    cleaned.remove(HOST);
    cleaned.remove(CONNECTION);
    cleaned
}

/// Strip response headers made stale by the outbound client: it has already
/// decompressed and fully buffered the body, so the original framing headers
/// no longer describe what we send. The server layer recomputes them.
pub fn clean_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut cleaned = headers.clone();
    cleaned.remove(CONTENT_ENCODING);
    cleaned.remove(CONTENT_LENGTH);
    cleaned.remove(TRANSFER_ENCODING);
    cleaned
}

/// Rewrite a `Location` value that points at the origin into a proxy-relative
/// path, so redirected clients keep talking to the proxy. Absolute external
/// and already-relative locations pass through unchanged.
pub fn rewrite_location(location: &str, origin_base: &str) -> (String, bool) {
    let base = origin_base.trim_end_matches('/');
    match location.strip_prefix(base) {
        Some("") => ("/".to_string(), true),
        Some(stripped) => (stripped.to_string(), true),
        None => (location.to_string(), false),
    }
}

/// Flatten a `HeaderMap` into the persisted form: lowercase names, insertion
/// order kept, repeated names collapsed to the last value.
pub fn to_ordered(headers: &HeaderMap) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for (name, value) in headers {
        let value = match value.to_str() {
            Ok(text) => text.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        map.insert(name.as_str().to_string(), value);
    }
    map
}

/// Rebuild a `HeaderMap` from the persisted form, skipping names or values
/// that are no longer valid header syntax.
pub fn to_header_map(map: &IndexMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in map {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;

    fn response_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1234"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers
    }

    #[test]
    fn request_cleanup_removes_hop_headers_only() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("proxy.example"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let cleaned = clean_request_headers(&headers);
        assert!(!cleaned.contains_key(HOST));
        assert!(!cleaned.contains_key(CONNECTION));
        assert!(cleaned.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn response_cleanup_is_idempotent() {
        let once = clean_response_headers(&response_headers());
        let twice = clean_response_headers(&once);
        assert_eq!(once, twice);
        assert!(!twice.contains_key(CONTENT_ENCODING));
        assert!(twice.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn mixed_case_names_round_trip_as_lowercase() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"X-Custom-Header").unwrap(),
            HeaderValue::from_static("value"),
        );
        let ordered = to_ordered(&headers);
        assert_eq!(ordered.get("x-custom-header").unwrap(), "value");

        let rebuilt = to_header_map(&ordered);
        assert_eq!(rebuilt.get("X-CUSTOM-HEADER").unwrap(), "value");
    }

    #[test]
    fn location_on_origin_becomes_relative() {
        let (location, changed) = rewrite_location("http://origin:8080/foo", "http://origin:8080");
        assert_eq!(location, "/foo");
        assert!(changed);
    }

    #[test]
    fn location_matching_origin_exactly_becomes_root() {
        let (location, changed) = rewrite_location("http://origin/", "http://origin/");
        assert_eq!(location, "/");
        assert!(changed);
    }

    #[test]
    fn external_and_relative_locations_pass_through() {
        let (location, changed) =
            rewrite_location("https://other.example/x", "http://origin:8080");
        assert_eq!(location, "https://other.example/x");
        assert!(!changed);

        let (location, changed) = rewrite_location("/already/relative", "http://origin:8080");
        assert_eq!(location, "/already/relative");
        assert!(!changed);
    }

    #[test]
    fn rewriting_twice_is_a_no_op_after_the_first() {
        let (first, _) = rewrite_location("http://origin/foo", "http://origin");
        let (second, changed) = rewrite_location(&first, "http://origin");
        assert_eq!(first, second);
        assert!(!changed);
    }
}
