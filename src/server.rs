//! HTTP server and graceful shutdown.
//!
//! A small embedding host for a [`Handler`]: usually a
//! [`PushMiddleware`](crate::middleware::pubsub::PushMiddleware) wrapping the
//! application. Any other host works as well; all it needs is to turn its
//! requests into [`Request`] values and call the handler.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Stops `listener.accept()`; no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`].
//!
//! Push subscriptions redeliver anything that was not acknowledged with a
//! success status, so draining matters: a request cut off mid-handler is
//! delivered again.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use pushgate::Server;
    /// let server = Server::bind(([0, 0, 0, 0], 8080));
    /// ```
    pub fn bind(addr: impl Into<SocketAddr>) -> Self {
        Self { addr: addr.into() }
    }

    /// Accepts connections and dispatches every request to `handler`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, handler: impl Handler) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener, handler.into_boxed_handler(), shutdown_signal()).await
    }

    async fn serve_on(
        self,
        listener: TcpListener,
        handler: BoxedHandler,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        info!(addr = %listener.local_addr()?, "pushgate listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // shutdown wins over queued accepts
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let handler = Arc::clone(&handler);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // called once per request on the connection
                        let svc = service_fn(move |req: hyper::Request<Incoming>| {
                            let fut = handler.call(Request::new(req));
                            async move { Ok::<_, std::convert::Infallible>(fut.await.into_inner()) }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("pushgate stopped");
        Ok(())
    }
}

/// Resolves on the first SIGTERM or SIGINT. If a signal handler cannot be
/// installed the corresponding arm never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
