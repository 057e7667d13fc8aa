//! Wellness Cache - inspection server
//!
//! Runs the named caches, the resource manager and the memory monitor, and
//! exposes their stats over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wellness_cache::api::{create_router, AppState};
use wellness_cache::clock::system_clock;
use wellness_cache::config::Config;
use wellness_cache::monitor::{MemoryMonitor, SharedHeapProbe, SystemHeapProbe};
use wellness_cache::resources::{NoopReleaser, ResourceManager};
use wellness_cache::CacheRegistry;

/// Priority of the resource manager's task among the cache tasks (10..50).
const RESOURCE_CLEANUP_PRIORITY: u32 = 40;

/// Main entry point for the inspection server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the caches, the resource manager and the monitor
/// 4. Register cleanup tasks and start every timer
/// 5. Serve HTTP until SIGINT/SIGTERM, then destroy everything
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wellness_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Wellness Cache inspection server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        resource_budget = config.resources.max_memory_bytes,
        cooldown_ms = config.monitor.cooldown_ms,
        "Configuration loaded"
    );

    let clock = system_clock();
    let probe: SharedHeapProbe = Arc::new(SystemHeapProbe::new());
    let monitor = Arc::new(MemoryMonitor::new(config.monitor.clone(), probe, clock.clone())?);

    let caches = Arc::new(CacheRegistry::from_config(&config, clock.clone())?);
    let resources = Arc::new(ResourceManager::new(
        config.resources.clone(),
        clock,
        Arc::new(NoopReleaser),
    )?);

    for task in caches.cleanup_tasks().await {
        monitor.register_cleanup_task(task).await;
    }
    monitor
        .register_cleanup_task(resources.cleanup_task(RESOURCE_CLEANUP_PRIORITY).await)
        .await;

    // Caches judge host pressure exactly as the monitor does
    caches.start(monitor.gauge()).await;
    resources.start().await;
    monitor.start();
    info!("Background timers started");

    let state = AppState::new(caches.clone(), resources.clone(), monitor.clone());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.destroy();
    resources.destroy().await;
    caches.destroy().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
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
