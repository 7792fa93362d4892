//! # pushgate
//!
//! HTTP middleware that turns Pub/Sub push deliveries back into the requests
//! their publishers meant to send.
//!
//! ## The contract
//!
//! A push subscription POSTs every message wrapped in a JSON envelope: the
//! payload base64-encoded under `message.data`, attributes and ids next to
//! it. Handlers should not have to know. pushgate unwraps the envelope in
//! front of them:
//!
//! - the body becomes the decoded payload, with a correct length
//! - every attribute becomes an `X-Pubsub-<key>` header
//! - a `Content-Type` attribute replaces the request's content type
//! - `X-Pubsub-Message-Id` and `X-Pubsub-Subscription` carry the ids
//!
//! Everything that is not an envelope passes through untouched, body and all.
//!
//! What pushgate intentionally leaves to other layers:
//!
//! - **Authenticity**: verify the push token before this layer
//! - **Body-size limits**: `client_max_body_size` in nginx, or a length-limited body
//! - **Acknowledgement and retries**: the status your handler returns is the ack
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pushgate::middleware::pubsub::{PushMiddleware, PushOptions};
//! use pushgate::{Request, Response, Server};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = PushMiddleware::new(
//!         on_order_event,
//!         PushOptions::new().prefixes(["/push/"]),
//!     );
//!
//!     Server::bind(([0, 0, 0, 0], 8080)).serve(app).await.unwrap();
//! }
//!
//! async fn on_order_event(req: Request) -> Response {
//!     let Some(id) = req.header("x-pubsub-message-id").map(str::to_owned) else {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     };
//!     match req.bytes().await {
//!         // the original payload, already base64-decoded
//!         Ok(_payload) => Response::text(id),
//!         Err(_) => Response::status(StatusCode::BAD_REQUEST),
//!     }
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod server;

pub mod middleware;

pub use error::{BoxError, Error, PushError};
pub use handler::Handler;
pub use request::{Body, Request};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use server::Server;
