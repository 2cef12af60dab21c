//! Process bootstrap: logging, platform registration, game loop, control API.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::control;
use crate::lifecycle::LifecycleController;
use crate::platform::{HostPlatform, ProcessParameters};
use crate::tick;

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

/// Run the server until the platform terminates it or Ctrl+C arrives.
///
/// Platform initialization failures return early, before the game loop
/// starts.
pub async fn run(config: ServerConfig, platform: Arc<dyn HostPlatform>) -> Result<()> {
    platform
        .init_sdk()
        .context("platform SDK initialization failed")?;

    let controller = Arc::new(LifecycleController::new(
        Arc::clone(&platform),
        config.session_config(),
    ));

    let listener = TcpListener::bind(config.control_bind)
        .await
        .with_context(|| format!("failed to bind control API on {}", config.control_bind))?;

    let params = ProcessParameters {
        port: config.port,
        log_paths: Vec::new(),
    };
    platform
        .process_ready(&params)
        .context("platform rejected process ready")?;

    let game_loop = tick::spawn(Arc::clone(&controller), config.tick_rate)
        .context("failed to start game loop")?;
    let control = tokio::spawn(control::serve(Arc::clone(&controller), listener));

    tokio::select! {
        _ = controller.wait_for_shutdown() => {
            tracing::info!("Shutdown requested by platform");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
        }
    }

    // Idempotent: after a platform terminate this only re-raises the flag.
    controller.end_process();

    tokio::task::spawn_blocking(move || game_loop.join())
        .await
        .context("game loop join task failed")?
        .map_err(|_| anyhow!("game loop panicked"))?;

    match control.await {
        Ok(result) => result.context("control API failed")?,
        Err(e) => return Err(anyhow!(e).context("control API task failed")),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
