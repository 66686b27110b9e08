//! Region Cache server
//!
//! Starts the region manager with the second-level cache templates and
//! serves it over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use region_cache::api::create_router;
use region_cache::persistence::second_level_cache_properties;
use region_cache::{
    spawn_sweep_task, AppState, Config, PersistenceProperties, RegionFactory, RegionManager,
};

/// Main entry point for the region cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Start the region manager with its templates
/// 4. Assemble the persistence properties against the manager
/// 5. Start background expiration sweep
/// 6. Serve HTTP until SIGINT/SIGTERM
/// 7. Flush regions and close the manager
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "region_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Region Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, lifespan={}ms, max_idle={}ms, passivation={}, port={}, sweep_interval={}s",
        config.max_entries,
        config.lifespan_ms,
        config.max_idle_ms,
        config.passivation,
        config.server_port,
        config.sweep_interval
    );

    let manager_config = config
        .manager_config(Vec::new())
        .context("invalid cache configuration")?;
    let manager = RegionManager::start(manager_config)
        .await
        .context("failed to start region manager")?;
    info!(cluster = %manager.cluster_name(), "Region manager started");

    let factory = RegionFactory::new(manager.clone());
    let properties = PersistenceProperties::assemble(vec![second_level_cache_properties(&factory)]);
    debug!(
        properties = %serde_json::to_string(&properties).unwrap_or_default(),
        "Persistence properties assembled"
    );

    let sweep_handle = spawn_sweep_task(manager.clone(), config.sweep_interval);
    info!("Background expiration sweep started");

    let app = create_router(AppState::new(manager.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")?;

    let flushed = manager.shutdown().await;
    info!(flushed, "Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
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

    sweep_handle.abort();
    warn!("Expiration sweep aborted");
}
