//! Middleware layer.
//!
//! Middleware wraps a [`Handler`](crate::Handler) and is a handler itself, so
//! layers nest: each one receives the request, may rewrite it or answer on
//! its own, and otherwise calls the handler it wraps exactly once.
//!
//! Built-in middleware:
//! - [`pubsub`]: unwraps Pub/Sub push envelopes into plain requests

pub mod pubsub;
