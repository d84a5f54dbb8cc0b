//! Voice Agent Widget Host
//!
//! Wires the session controller to its host collaborators: environment
//! configuration, the HTTP token endpoint, the WebSocket transport, the system
//! browser and the audio surface. The `widget` binary is a thin wrapper around
//! this library.

pub mod audio;
pub mod config;
pub mod navigator;

use audio::PlaybackSurface;
use config::Config;
use navigator::DesktopNavigator;
use std::sync::Arc;
use webagent_core::{HttpCredentialFetcher, SessionController, SessionSettings};
use webagent_realtime::WsTransport;

/// Builds a controller for one session attempt from the loaded configuration.
pub fn build_controller(
    config: &Config,
    surface: Arc<PlaybackSurface>,
    on_close: impl FnOnce() + Send + Sync + 'static,
) -> SessionController {
    SessionController::new(
        SessionSettings::new(config.identity.clone(), config.livekit_url.clone()),
        Arc::new(HttpCredentialFetcher::new(config.backend_url.clone())),
        Arc::new(WsTransport::new()),
        Arc::new(DesktopNavigator::new()),
        surface,
        on_close,
    )
}
