//! Shardcache - A sharded key-value caching proxy
//!
//! Fronts a pool of key-value store nodes behind a REST surface, sharding
//! keys across nodes and partitioning cache bins into database indices. The
//! shipped binary runs against in-process memory shards, one per configured
//! address; production deployments plug a real store in behind the
//! `Backend` trait.

mod api;
mod backend;
mod config;
mod error;
mod mapping;
mod models;
mod routing;

use std::net::SocketAddr;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use backend::MemoryCluster;
use config::ProxyConfig;
use mapping::FileMappingStore;

/// Main entry point for the Shardcache proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the node pool (one node per configured address)
/// 4. Wire the bin resolver to the mapping file
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shardcache proxy");

    // Load configuration from environment variables
    let config = ProxyConfig::from_env();
    info!(
        "Configuration loaded: servers={:?}, default_bin={}, mapping_path={}, port={}",
        config.servers,
        config.default_bin,
        config.mapping_path.display(),
        config.server_port
    );

    // Connect the pool and wire up the router; a totally unreachable pool
    // aborts startup instead of serving misses forever
    let cluster = MemoryCluster::new();
    let store = Box::new(FileMappingStore::new(config.mapping_path.clone()));
    let state = AppState::from_config(&config, &cluster, store)?;
    info!(
        "Cache router initialized with {} live nodes",
        state.router.pool().len()
    );

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Proxy listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
