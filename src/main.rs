//! kvtxt - An encrypted key-value text store
//!
//! Server binary: loads configuration, opens the store and serves the API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kvtxt::cache::EntryCache;
use kvtxt::crypto::CipherBox;
use kvtxt::storage::EntryStore;
use kvtxt::api::{serve, SHUTDOWN_TIMEOUT};
use kvtxt::{create_router, spawn_reconciler, AppState, Config, KvService};

/// Main entry point for the kvtxt server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the store, build the cipher, cache and service
/// 4. Start the expiry reconciler
/// 5. Serve HTTP until SIGINT/SIGTERM, draining for at most `SHUTDOWN_TIMEOUT`
/// 6. Stop the reconciler and close the store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kvtxt=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting kvtxt server");

    let config = Config::from_env().context("invalid configuration")?;
    info!(?config, "Configuration loaded");

    let cipher = CipherBox::new(&config.encryption_key).context("invalid ENCRYPTION_KEY")?;

    let store = EntryStore::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    info!("Entry store ready");

    let cache = EntryCache::new(config.cache_capacity);
    let service = KvService::new(store.clone(), cipher, cache, config.ttl);

    let cancel = CancellationToken::new();
    let reconciler = spawn_reconciler(store.clone(), config.cleanup_interval(), cancel.clone());

    let state = AppState::new(service).with_max_payload_bytes(config.max_payload_bytes());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let served = serve(listener, app, shutdown, SHUTDOWN_TIMEOUT).await;

    cancel.cancel();
    if let Err(e) = reconciler.await {
        error!(error = %e, "expiry reconciler ended abnormally");
    }
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, store.close()).await.is_err() {
        warn!("store did not close within the shutdown timeout");
    }

    served.context("server error")?;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
