//! Error types.

/// Boxed error carried by request bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by pushgate's fallible infrastructure operations.
///
/// Rejected push requests are expressed as HTTP responses, not as `Error`s.
/// This type surfaces infrastructure failures: binding to a port or accepting
/// a connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the push middleware refused to forward a request.
///
/// Both variants become `400 Bad Request` with the `Display` text as body.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The body stream failed while being buffered.
    #[error("failed to read request body: {0}")]
    ReadBody(#[source] BoxError),

    /// The body looked like an envelope but did not decode as one.
    #[error("invalid pubsub push message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
}
