//! Incoming HTTP request type.

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri};
use http_body::Body as HttpBody;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};

use crate::error::BoxError;

/// The body stream of a [`Request`]: any `http-body` body yielding [`Bytes`],
/// boxed so every handler in a chain sees the same type.
pub type Body = UnsyncBoxBody<Bytes, BoxError>;

/// An incoming HTTP request.
///
/// A thin wrapper over `http::Request<Body>`. The body is a stream and can be
/// read exactly once; middleware that inspects it must put a fresh one back.
pub struct Request {
    inner: http::Request<Body>,
}

impl Request {
    /// Wraps any `http::Request` whose body yields [`Bytes`].
    ///
    /// ```rust
    /// use http_body_util::Full;
    /// use pushgate::Request;
    ///
    /// let req = Request::new(
    ///     http::Request::post("/push").body(Full::new(bytes::Bytes::from_static(b"{}"))).unwrap(),
    /// );
    /// assert_eq!(req.path(), "/push");
    /// ```
    pub fn new<B>(req: http::Request<B>) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self { inner: req.map(|body| body.map_err(Into::into).boxed_unsync()) }
    }

    pub fn from_parts(parts: Parts, body: Body) -> Self {
        Self { inner: http::Request::from_parts(parts, body) }
    }

    pub fn method(&self) -> &Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { self.inner.headers_mut() }

    /// Per-request state set by earlier layers (deadlines, ids, auth, ...).
    pub fn extensions(&self) -> &Extensions { self.inner.extensions() }
    pub fn extensions_mut(&mut self) -> &mut Extensions { self.inner.extensions_mut() }

    /// Case-insensitive header lookup. `None` when absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Declared body length.
    ///
    /// The `Content-Length` header as received, else the exact size the body
    /// stream reports. Reading the body does not change the header, so
    /// middleware that has drained it still sees what the client declared.
    /// `None` when neither is known.
    pub fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH.as_str())
            .and_then(|v| v.trim().parse().ok())
            .or_else(|| self.inner.body().size_hint().exact())
    }

    pub fn body_mut(&mut self) -> &mut Body { self.inner.body_mut() }

    pub fn into_parts(self) -> (Parts, Body) { self.inner.into_parts() }

    pub fn into_inner(self) -> http::Request<Body> { self.inner }

    /// Reads the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes, BoxError> {
        Ok(self.inner.into_body().collect().await?.to_bytes())
    }
}

/// A body that yields `bytes` in a single frame and reports its exact length.
pub(crate) fn full_body(bytes: Bytes) -> Body {
    Full::new(bytes).map_err(|never| match never {}).boxed_unsync()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> http::request::Builder {
        http::Request::post("/push/topic?x=1")
    }

    #[test]
    fn accessors_read_the_wrapped_request() {
        let req = Request::new(
            post()
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(b"abc")))
                .unwrap(),
        );

        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.path(), "/push/topic");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[tokio::test]
    async fn content_length_reports_header_after_body_is_drained() {
        let mut req = Request::new(
            post()
                .header("content-length", "3")
                .body(Full::new(Bytes::from_static(b"abc")))
                .unwrap(),
        );
        req.body_mut().collect().await.unwrap();

        assert_eq!(req.body_mut().size_hint().exact(), Some(0));
        assert_eq!(req.content_length(), Some(3));
    }

    #[test]
    fn content_length_falls_back_to_exact_body_size() {
        let req = Request::new(post().body(Full::new(Bytes::from_static(b"abcd"))).unwrap());
        assert_eq!(req.content_length(), Some(4));

        let stream = futures_util::stream::iter(vec![Ok::<_, BoxError>(
            http_body::Frame::data(Bytes::from_static(b"abcd")),
        )]);
        let req = Request::new(post().body(http_body_util::StreamBody::new(stream)).unwrap());
        assert_eq!(req.content_length(), None);
    }

    #[test]
    fn uri_and_headers_mut_edit_in_place() {
        let mut req = Request::new(post().body(Full::new(Bytes::new())).unwrap());
        req.headers_mut().insert("x-trace", http::HeaderValue::from_static("t1"));

        assert_eq!(req.uri().query(), Some("x=1"));
        assert_eq!(req.header("x-trace"), Some("t1"));
    }

    #[tokio::test]
    async fn into_inner_exposes_the_http_request() {
        let mut req = Request::new(post().body(Full::new(Bytes::from_static(b"raw"))).unwrap());
        req.extensions_mut().insert(5u8);

        let inner = req.into_inner();

        assert_eq!(inner.method(), Method::POST);
        assert_eq!(inner.extensions().get::<u8>(), Some(&5));
        assert_eq!(inner.into_body().collect().await.unwrap().to_bytes(), "raw");
    }

    #[tokio::test]
    async fn bytes_collects_the_body() {
        let req = Request::new(
            post().body(Full::new(Bytes::from_static(b"payload"))).unwrap(),
        );
        assert_eq!(req.bytes().await.unwrap(), Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn full_body_is_exact_and_readable() {
        let body = full_body(Bytes::from_static(b"hello"));
        assert_eq!(body.size_hint().exact(), Some(5));
        assert_eq!(body.collect().await.unwrap().to_bytes(), "hello");
    }
}
