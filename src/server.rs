//! TCP listener, accept loop and shutdown.
//!
//! The accept loop is sequential: it waits for a connection, spawns one task
//! for it and immediately goes back to `accept`. It never waits on request
//! processing. Connection tasks only share the route table, read-only.
//!
//! # Shutdown
//!
//! On SIGTERM or Ctrl-C (or the future passed to
//! [`Server::serve_with_shutdown`]) the server:
//! 1. stops calling `accept` and drops the listener, freeing the port;
//! 2. lets in-flight connection tasks run to completion, for at most the
//!    grace period ([`Server::with_grace_period`], 30 s by default);
//! 3. aborts whatever is still running (a stalled client never finishes on
//!    its own) and returns from `serve`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info, warn};

use crate::connection;
use crate::error::Error;
use crate::router::Router;

/// A bound HTTP server.
///
/// The listening socket is owned by this value, so it is released whenever
/// the `Server` is dropped: after `serve` returns, on an early `?`, or while
/// unwinding.
pub struct Server {
    listener: TcpListener,
    grace: Duration,
}

const DEFAULT_GRACE: Duration = Duration::from_secs(30);

impl Server {
    /// Binds the listening socket.
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), tinyroute::Error> {
    /// use tinyroute::{Router, Server};
    ///
    /// let server = Server::bind("127.0.0.1:0").await?;
    /// println!("listening on {}", server.local_addr()?);
    /// server.serve(Router::new()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, grace: DEFAULT_GRACE })
    }

    /// How long in-flight connections may keep running after the shutdown
    /// signal before they are aborted.
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// The address actually bound, useful after binding port `0`.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections and dispatches them through `router` until the
    /// process receives SIGTERM or Ctrl-C.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let Self { listener, grace } = self;
        let addr = listener.local_addr()?;

        // Routing is frozen from here on; tasks share it read-only.
        let router = Arc::new(router);
        info!(%addr, routes = router.len(), "tinyroute listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };
                    tasks.spawn(connection::handle(stream, peer, Arc::clone(&router)));
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!(remaining = tasks.len(), ?grace, "grace period elapsed, aborting connections");
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        info!(%addr, "tinyroute stopped");
        Ok(())
    }
}

/// Binds `0.0.0.0:<port>` and serves `router` until SIGTERM or Ctrl-C.
///
/// ```rust,no_run
/// use serde_json::json;
/// use tinyroute::{Params, Router};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tinyroute::Error> {
///     let app = Router::new().get("/users/:id", |p: Params| json!({ "user_id": p["id"] }));
///     tinyroute::start(3000, app).await
/// }
/// ```
pub async fn start(port: u16, router: Router) -> Result<(), Error> {
    Server::bind(("0.0.0.0", port)).await?.serve(router).await
}

/// Resolves on the first shutdown signal the process receives.
///
/// SIGTERM and SIGINT on Unix, Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
