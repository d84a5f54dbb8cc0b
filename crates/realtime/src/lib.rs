//! WebSocket transport for the widget's realtime voice session.
//!
//! Connects to `{server_url}/rtc` with the session credential as bearer auth,
//! negotiates the [`ConnectionConfig`] in a `join` frame, then pumps server
//! frames into [`RoomEvent`]s for the session controller.

pub mod protocol;
mod session;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use protocol::SignalRequest;
use session::WsRoomSession;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::client::IntoClientRequest};
use tracing::{info, warn};
use webagent_core::{ConnectionConfig, Credential, RealtimeTransport, RoomEvent, RoomSession};

#[derive(Debug, Clone)]
pub struct WsTransport {
    event_buffer: usize,
}

impl WsTransport {
    pub fn new() -> Self {
        Self { event_buffer: 64 }
    }

    pub fn with_event_buffer(event_buffer: usize) -> Self {
        Self {
            event_buffer: event_buffer.max(1),
        }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeTransport for WsTransport {
    async fn connect(
        &self,
        server_url: &str,
        credential: &Credential,
        config: &ConnectionConfig,
    ) -> Result<(Box<dyn RoomSession>, mpsc::Receiver<RoomEvent>)> {
        let url = format!("{}/rtc", server_url.trim_end_matches('/'));
        let mut request = url.as_str().into_client_request()?;
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {}", credential.expose()).parse()?,
        );

        let (ws_stream, _) = connect_async(request)
            .await
            .context("Failed to connect to realtime server")?;
        let (mut sink, stream) = ws_stream.split();
        info!(%url, "Connected to realtime server");

        session::send(
            &mut sink,
            &SignalRequest::Join {
                options: config.clone(),
            },
        )
        .await
        .context("Failed to send join request")?;

        let (events_tx, events_rx) = mpsc::channel(self.event_buffer);
        let reader = tokio::spawn(session::pump_events(stream, events_tx));
        let mut room = WsRoomSession::new(sink, reader, config);

        if config.video {
            warn!("Video publishing is not supported, ignoring");
        }
        if config.audio {
            room.set_microphone_enabled(true).await?;
        }

        let room: Box<dyn RoomSession> = Box::new(room);
        Ok((room, events_rx))
    }
}
