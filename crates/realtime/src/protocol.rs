//! JSON signalling frames exchanged with the realtime server.
//!
//! Text frames carry signalling; binary frames carry data channel packets.

use serde::{Deserialize, Serialize};
use webagent_core::{AudioCaptureOptions, ConnectionConfig, RemoteAudioTrack, RoomEvent};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Frames sent from the widget to the server.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalRequest {
    /// First frame on every connection; negotiates capture and bandwidth settings.
    Join { options: ConnectionConfig },
    PublishTrack {
        kind: TrackKind,
        capture: AudioCaptureOptions,
    },
    UnpublishTrack { kind: TrackKind },
    Leave,
}

/// Frames sent from the server to the widget.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalResponse {
    Joined {
        #[serde(default)]
        room: Option<String>,
    },
    TrackSubscribed {
        sid: String,
        participant: String,
        kind: TrackKind,
    },
    TrackUnsubscribed { sid: String },
    Leave {
        #[serde(default)]
        reason: Option<String>,
    },
    Error { message: String },
    #[serde(other)]
    Unknown,
}

impl SignalResponse {
    /// Maps a signalling frame onto a session event, if it has one.
    pub fn into_event(self) -> Option<RoomEvent> {
        match self {
            Self::Joined { .. } => Some(RoomEvent::Connected),
            Self::TrackSubscribed {
                sid,
                participant,
                kind: TrackKind::Audio,
            } => Some(RoomEvent::TrackSubscribed(RemoteAudioTrack { sid, participant })),
            Self::TrackSubscribed { .. } => None,
            Self::TrackUnsubscribed { sid } => Some(RoomEvent::TrackUnsubscribed { sid }),
            Self::Leave { reason } => Some(RoomEvent::Disconnected { reason }),
            Self::Error { message } => Some(RoomEvent::Error(message)),
            Self::Unknown => None,
        }
    }
}
