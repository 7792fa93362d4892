//! Envelope detection.

use crate::request::Request;

/// Decides whether a buffered request body is a push envelope.
///
/// Only called for requests that already passed the gate: `POST`, JSON
/// content type, matching path prefix. Implementations must not mutate
/// anything; the same request may be inspected again downstream.
///
/// Closures qualify directly:
///
/// ```rust
/// use pushgate::middleware::pubsub::PushOptions;
///
/// let options = PushOptions::new()
///     .detector(|req: &pushgate::Request, _body: &[u8]| req.header("x-goog-channel-id").is_none());
/// ```
pub trait Detector: Send + Sync + 'static {
    fn detect(&self, req: &Request, body: &[u8]) -> bool;
}

impl<F> Detector for F
where
    F: Fn(&Request, &[u8]) -> bool + Send + Sync + 'static,
{
    fn detect(&self, req: &Request, body: &[u8]) -> bool {
        self(req, body)
    }
}

/// The built-in detector: a textual sniff for the two top-level keys.
///
/// Matches when the body contains both `"subscription":` and `"message":`.
/// No parsing happens here. A false positive costs a `400` from the
/// transformer, never a silently corrupted request.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDetector;

const SUBSCRIPTION_KEY: &[u8] = br#""subscription":"#;
const MESSAGE_KEY: &[u8] = br#""message":"#;

impl Detector for DefaultDetector {
    fn detect(&self, _req: &Request, body: &[u8]) -> bool {
        contains(body, SUBSCRIPTION_KEY) && contains(body, MESSAGE_KEY)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
