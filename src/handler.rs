//! Handler trait and type erasure.
//!
//! # How handlers are chained
//!
//! The push middleware wraps *one* downstream handler whose concrete type it
//! does not know, and is itself a handler for whatever sits in front of it.
//! Both sides meet at the same trait object (`dyn ErasedHandler`):
//!
//! ```text
//! async fn ingest(req: Request) -> Response { … }   ← user writes this
//!        ↓ PushMiddleware::new(ingest, options)
//! ingest.into_boxed_handler()                        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(ingest))                        ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! next.call(req)  after the envelope is unwrapped    ← one vtable dispatch
//! ```
//!
//! The per-request cost of a layer is one virtual call and, for the
//! middleware, one `Arc` clone of its configuration.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Dispatch interface shared by user handlers and middleware.
///
/// `#[doc(hidden)] pub` because it appears in the return type of the public
/// [`Handler::into_boxed_handler`]. Implement [`Handler`] instead.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid downstream handler.
///
/// Automatically satisfied for any function with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// and for [`PushMiddleware`](crate::middleware::pubsub::PushMiddleware), so
/// middleware can wrap middleware. The trait is sealed.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// Crate-visible so middleware types in other modules can join the seal.
pub(crate) mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete function `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
