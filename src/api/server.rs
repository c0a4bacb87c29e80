//! HTTP Server
//!
//! Serves the router until shutdown is requested, then gives open
//! connections a bounded window to finish.

use std::future::IntoFuture;
use std::io;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Time open connections get to finish once shutdown starts.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Time a single request may take, body read included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `app` on `listener` until `shutdown` fires.
///
/// After the signal no new connections are accepted. Connections still open
/// after `drain_timeout` are abandoned and the function returns.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    drain_timeout: Duration,
) -> io::Result<()> {
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();

    let deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(drain_timeout).await;
    };

    let result = tokio::select! {
        result = server => result,
        _ = deadline => {
            warn!(
                timeout_ms = drain_timeout.as_millis() as u64,
                "connections still open after shutdown timeout, closing"
            );
            Ok(())
        }
    };
    result?;

    info!("HTTP server stopped");
    Ok(())
}
