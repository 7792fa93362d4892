//! Pub/Sub push envelope unwrapping.
//!
//! A push subscription delivers each message as a JSON `POST` whose body
//! wraps the real payload:
//!
//! ```json
//! { "message": { "attributes": {"Content-Type": "text/plain"},
//!                "data": "aGVsbG8=", "message_id": "abc123" },
//!   "subscription": "projects/p/subscriptions/s" }
//! ```
//!
//! [`PushMiddleware`] sits in front of a handler and turns that into the
//! request the publisher meant to send: body `hello`, `Content-Type:
//! text/plain`, plus `X-Pubsub-Content-Type`, `X-Pubsub-Message-Id` and
//! `X-Pubsub-Subscription` headers. Anything else passes through with its
//! body intact.
//!
//! Per request:
//!
//! 1. **Gate**: `POST`, `Content-Type: application/json…`, path prefix.
//!    Misses go straight downstream, body unread.
//! 2. **Buffer**: the body is copied into a pooled buffer.
//! 3. **Detect**: the [`Detector`] classifies the bytes.
//! 4. **Rewrite** ([`Envelope::apply`]) or **restore** the original body.
//!
//! Body read failures and undecodable envelopes end in `400 Bad Request`
//! and the handler is not called. Authenticity of the push is not checked
//! and body size is not limited; put those in front of this layer.

mod buffer;
mod detect;
mod envelope;
mod gate;
mod options;

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

pub use buffer::{BufferPool, PooledBuffer};
pub use detect::{DefaultDetector, Detector};
pub use envelope::{
    ATTRIBUTE_HEADER_PREFIX, Envelope, MESSAGE_ID_HEADER, Message, SUBSCRIPTION_HEADER,
};
pub use options::PushOptions;

use crate::error::PushError;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, private};
use crate::request::{Request, full_body};
use crate::response::{IntoResponse, Response};

/// Middleware that unwraps push envelopes before calling `next`.
///
/// ```rust,no_run
/// use pushgate::middleware::pubsub::{PushMiddleware, PushOptions};
/// use pushgate::{Request, Response, Server};
///
/// async fn ingest(req: Request) -> Response {
///     let id = req.header("x-pubsub-message-id").unwrap_or("-").to_owned();
///     let _payload = req.bytes().await;
///     Response::text(id)
/// }
///
/// # async fn run() -> Result<(), pushgate::Error> {
/// let app = PushMiddleware::new(ingest, PushOptions::new().prefixes(["/push/"]));
/// Server::bind(([0, 0, 0, 0], 8080)).serve(app).await
/// # }
/// ```
#[derive(Clone)]
pub struct PushMiddleware {
    next: BoxedHandler,
    config: Arc<PushOptions>,
}

impl PushMiddleware {
    /// Wraps `next`. `options` is frozen from here on.
    pub fn new(next: impl Handler, options: PushOptions) -> Self {
        Self { next: next.into_boxed_handler(), config: Arc::new(options) }
    }

    /// Runs one request through the middleware and the handler behind it.
    ///
    /// The entry point for hosts other than [`Server`](crate::Server).
    pub async fn handle(&self, req: Request) -> Response {
        ErasedHandler::call(self, req).await
    }

    /// Buffers, classifies and forwards a request that passed the gate.
    async fn handle_push(self, mut req: Request) -> Response {
        let mut buf = BufferPool::shared().acquire();
        if let Some(len) = req.content_length() {
            buf.reserve_hint(len);
        }

        if let Err(err) = buf.fill_from(req.body_mut()).await {
            debug!(path = %req.path(), error = %err, "push body read failed");
            return PushError::ReadBody(err).into_response();
        }

        if !self.config.detector.detect(&req, &buf) {
            trace!(path = %req.path(), "not a push envelope, restoring body");
            *req.body_mut() = full_body(Bytes::copy_from_slice(&buf));
            drop(buf);
            return self.next.call(req).await;
        }

        let envelope = match Envelope::from_slice(&buf) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(path = %req.path(), error = %err, "invalid push envelope");
                return PushError::from(err).into_response();
            }
        };
        drop(buf);

        debug!(
            path = %req.path(),
            message_id = %envelope.message.message_id,
            subscription = %envelope.subscription,
            "unwrapped push envelope"
        );
        self.next.call(envelope.apply(req)).await
    }
}

impl ErasedHandler for PushMiddleware {
    fn call(&self, req: Request) -> BoxFuture {
        if !gate::admits(&req, &self.config.prefixes) {
            return self.next.call(req);
        }
        Box::pin(self.clone().handle_push(req))
    }
}

impl private::Sealed for PushMiddleware {}

impl Handler for PushMiddleware {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}
