//! Push endpoint receiving Pub/Sub deliveries.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example push_receiver
//!
//! Try (the envelope a push subscription would send):
//!   curl -X POST http://localhost:8080/push/orders \
//!        -H 'content-type: application/json' \
//!        -d '{"message":{"attributes":{"Content-Type":"text/plain"},"data":"aGVsbG8=","message_id":"abc123"},"subscription":"projects/p/subscriptions/s"}'
//!
//! And a request the middleware leaves alone:
//!   curl -X POST http://localhost:8080/push/orders \
//!        -H 'content-type: application/json' -d '{"order":1}'

use http::StatusCode;
use pushgate::middleware::pubsub::{PushMiddleware, PushOptions};
use pushgate::{Request, Response, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pushgate=debug".into()),
        )
        .init();

    let app = PushMiddleware::new(orders, PushOptions::new().prefixes(["/push/"]));

    Server::bind(([0, 0, 0, 0], 8080))
        .serve(app)
        .await
        .expect("server error");
}

// POST /push/orders
//
// Unwrapped deliveries carry X-Pubsub-* headers; direct posts do not.
// Any 2xx acknowledges the message, anything else makes Pub/Sub retry.
async fn orders(req: Request) -> Response {
    let id = req.header("x-pubsub-message-id").unwrap_or("direct").to_owned();
    let content_type = req.header("content-type").unwrap_or("").to_owned();

    match req.bytes().await {
        Ok(body) => {
            tracing::info!(%id, %content_type, len = body.len(), "order event");
            Response::status(StatusCode::NO_CONTENT)
        }
        Err(e) => Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .text(format!("unreadable body: {e}")),
    }
}
