//! Outbound response assembly.

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::Bytes;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// The response a handler produces: status, headers and a fully buffered
/// body. Converted into an axum response at the server boundary, which
/// recomputes `content-length`.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Outbound {
    /// Plain-text response, used for error and not-found bodies.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status,
            headers,
            body: Bytes::from(body.into()),
        }
    }
}

impl IntoResponse for Outbound {
    fn into_response(self) -> Response<Body> {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Build a response from cached or fetched parts. When `content-type` is
/// absent it is guessed from the request path's extension, falling back to
/// `application/octet-stream`.
pub fn build_response(
    status_code: u16,
    mut headers: HeaderMap,
    body: Bytes,
    guess_path: Option<&str>,
) -> Outbound {
    if !headers.contains_key(CONTENT_TYPE) {
        let guessed = guess_path
            .and_then(|path| mime_guess::from_path(path).first_raw())
            .unwrap_or(DEFAULT_MIME_TYPE);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(guessed));
    }
    let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::OK);
    Outbound {
        status,
        headers,
        body,
    }
}
