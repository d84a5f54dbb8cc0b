//! A live WebSocket session: outbound signalling and the inbound event pump.

use crate::protocol::{SignalRequest, SignalResponse, TrackKind};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::protocol::Message};
use tracing::{debug, info, warn};
use webagent_core::{AudioCaptureOptions, ConnectionConfig, RoomEvent, RoomSession};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;

/// Exclusive hold on the local microphone. Dropping it releases the device.
#[derive(Debug)]
pub(crate) struct MicrophoneCapture {
    options: AudioCaptureOptions,
}

impl MicrophoneCapture {
    fn open(options: AudioCaptureOptions) -> Self {
        info!(
            sample_rate = options.sample_rate,
            echo_cancellation = options.echo_cancellation,
            noise_suppression = options.noise_suppression,
            auto_gain_control = options.auto_gain_control,
            "Microphone acquired"
        );
        Self { options }
    }
}

impl Drop for MicrophoneCapture {
    fn drop(&mut self) {
        info!(sample_rate = self.options.sample_rate, "Microphone released");
    }
}

pub(crate) struct WsRoomSession {
    sink: WsSink,
    reader: JoinHandle<()>,
    capture: AudioCaptureOptions,
    stop_local_track_on_unpublish: bool,
    microphone: Option<MicrophoneCapture>,
    publishing: bool,
    closed: bool,
}

impl WsRoomSession {
    pub(crate) fn new(sink: WsSink, reader: JoinHandle<()>, config: &ConnectionConfig) -> Self {
        Self {
            sink,
            reader,
            capture: config.audio_capture_defaults,
            stop_local_track_on_unpublish: config.stop_local_track_on_unpublish,
            microphone: None,
            publishing: false,
            closed: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn microphone_held(&self) -> bool {
        self.microphone.is_some()
    }

    async fn unpublish_microphone(&mut self) -> Result<()> {
        if self.publishing {
            self.publishing = false;
            send(
                &mut self.sink,
                &SignalRequest::UnpublishTrack {
                    kind: TrackKind::Audio,
                },
            )
            .await?;
        }
        if self.stop_local_track_on_unpublish {
            self.microphone = None;
        }
        Ok(())
    }
}

#[async_trait]
impl RoomSession for WsRoomSession {
    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<()> {
        if self.closed {
            anyhow::bail!("session already left");
        }
        if !enabled {
            return self.unpublish_microphone().await;
        }
        if self.publishing {
            return Ok(());
        }
        if self.microphone.is_none() {
            self.microphone = Some(MicrophoneCapture::open(self.capture));
        }
        send(
            &mut self.sink,
            &SignalRequest::PublishTrack {
                kind: TrackKind::Audio,
                capture: self.capture,
            },
        )
        .await?;
        self.publishing = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.reader.abort();

        // Leaving always frees the device, whatever the unpublish setting.
        let unpublished = self.unpublish_microphone().await;
        self.microphone = None;

        send(&mut self.sink, &SignalRequest::Leave).await?;
        self.sink.close().await?;
        info!("Left realtime session");
        unpublished
    }
}

impl Drop for WsRoomSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Forwards server frames to the controller until the session ends.
pub(crate) async fn pump_events(mut stream: SplitStream<WsStream>, events: mpsc::Sender<RoomEvent>) {
    while let Some(frame) = stream.next().await {
        let event = match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<SignalResponse>(&text) {
                Ok(response) => response.into_event(),
                Err(e) => {
                    warn!(error = %e, "Ignoring unparseable signalling frame");
                    None
                }
            },
            Ok(Message::Binary(data)) => Some(RoomEvent::DataReceived {
                payload: Bytes::from(data),
                topic: None,
                participant: None,
            }),
            Ok(Message::Close(frame)) => Some(RoomEvent::Disconnected {
                reason: frame
                    .map(|f| f.reason.to_string())
                    .filter(|reason| !reason.is_empty()),
            }),
            Ok(_) => None,
            Err(e) => Some(RoomEvent::Error(e.to_string())),
        };

        let Some(event) = event else { continue };
        let terminal = matches!(
            event,
            RoomEvent::Disconnected { .. } | RoomEvent::Error(_)
        );
        if events.send(event).await.is_err() {
            debug!("Event receiver dropped, stopping reader");
            return;
        }
        if terminal {
            return;
        }
    }

    let _ = events
        .send(RoomEvent::Disconnected {
            reason: Some("connection closed".to_string()),
        })
        .await;
}

pub(crate) async fn send(sink: &mut WsSink, request: &SignalRequest) -> Result<()> {
    let serialized = serde_json::to_string(request)?;
    sink.send(Message::Text(serialized.into())).await?;
    Ok(())
}
