//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. The server turns it
//! into a hyper response; the push middleware hands it back untouched.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

use crate::error::PushError;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use http::StatusCode;
/// use pushgate::Response;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use http::{HeaderName, HeaderValue, StatusCode};
/// use pushgate::Response;
///
/// Response::builder()
///     .status(StatusCode::ACCEPTED)
///     .header(HeaderName::from_static("x-handled-by"), HeaderValue::from_static("worker-1"))
///     .text("queued");
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// `200 OK` with `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts into the hyper-facing representation.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header; repeated names keep every value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(HeaderValue::from_static(JSON), body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(HeaderValue::from_static(TEXT), Bytes::from(body.into()))
    }

    /// Terminate with a body of any content type.
    pub fn bytes(self, content_type: HeaderValue, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, body.into())
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(mut self, content_type: HeaderValue, body: Bytes) -> Response {
        self.headers.insert(CONTENT_TYPE, content_type);
        Response { body, headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// `400 Bad Request`, plain text, the error's message as body.
impl IntoResponse for PushError {
    fn into_response(self) -> Response {
        Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"))
            .text(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_status_headers_and_content_type() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header(HeaderName::from_static("location"), HeaderValue::from_static("/jobs/9"))
            .json(&b"{}"[..]);

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.header("location"), Some("/jobs/9"));
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body(), &Bytes::from_static(b"{}"));
    }

    #[test]
    fn push_error_renders_bad_request() {
        let res = PushError::ReadBody("boom".into()).into_response();

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(res.body(), &Bytes::from_static(b"failed to read request body: boom"));
    }

    #[test]
    fn into_inner_keeps_every_part() {
        let res = Response::builder()
            .status(StatusCode::ACCEPTED)
            .bytes(HeaderValue::from_static("application/octet-stream"), vec![1u8, 2, 3])
            .into_inner();

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.headers()["content-type"], "application/octet-stream");
    }

    #[test]
    fn no_body_keeps_headers_without_content_type() {
        let res = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header(HeaderName::from_static("x-acked"), HeaderValue::from_static("1"))
            .no_body();

        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert_eq!(res.header("x-acked"), Some("1"));
        assert_eq!(res.header("content-type"), None);
        assert!(res.body().is_empty());
    }
}
