//! The seam between the session controller and a realtime media transport.

use crate::{config::ConnectionConfig, credential::Credential, renderer::RemoteAudioTrack};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Lifecycle and data events reported by a live transport session.
///
/// Events for one session arrive in order on a single channel, so a data
/// packet queued behind a disconnect is observed after it.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// The session is live.
    Connected,
    /// A packet arrived on the data channel.
    DataReceived {
        payload: Bytes,
        topic: Option<String>,
        participant: Option<String>,
    },
    TrackSubscribed(RemoteAudioTrack),
    TrackUnsubscribed { sid: String },
    /// The server or network ended the session.
    Disconnected { reason: Option<String> },
    /// An unrecoverable transport failure.
    Error(String),
}

/// A connected transport session.
#[async_trait]
pub trait RoomSession: Send {
    /// Publishes or unpublishes the local microphone track.
    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Leaves the session and releases every local capture device.
    async fn disconnect(&mut self) -> Result<()>;
}

/// Opens transport sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(
        &self,
        server_url: &str,
        credential: &Credential,
        config: &ConnectionConfig,
    ) -> Result<(Box<dyn RoomSession>, mpsc::Receiver<RoomEvent>)>;
}
