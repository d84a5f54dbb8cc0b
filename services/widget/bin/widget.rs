//! Main Entrypoint for the Voice Agent Widget
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Mounting one session controller.
//! 4. Waiting for the controller to close the widget, or for `Ctrl+C` to unmount it.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};
use webagent_widget::{audio::PlaybackSurface, build_controller, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!(
        backend_url = %config.backend_url,
        livekit_url = %config.livekit_url,
        identity = %config.identity,
        "Configuration loaded. Mounting widget..."
    );

    // --- 3. Mount the Session Controller ---
    let (close_tx, close_rx) = oneshot::channel();
    let surface = Arc::new(PlaybackSurface::default());
    let handle = build_controller(&config, surface, move || {
        let _ = close_tx.send(());
    })
    .mount();

    // --- 4. Run Until Closed or Interrupted ---
    let outcome = tokio::select! {
        _ = close_rx => handle.finished().await,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal. Unmounting widget...");
            handle.unmount().await
        }
    };

    match outcome {
        Ok(()) => info!("Widget unmounted."),
        Err(e) => error!(error = %e, "Widget closed."),
    }
    Ok(())
}
